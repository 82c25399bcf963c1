//! Run the flight core on the host, listening for control frames over UDP.
//!
//! Usage: cargo run -p wst_sitl -- --frame bicopter --port 4210

use std::process::ExitCode;

use wst_core::link::LinkHealth;
use wst_sitl::{parse_args, run, SitlError, UdpPort, USAGE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match start(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wst_sitl: {e}");
            if matches!(e, SitlError::InvalidArgument(_)) {
                eprintln!("{USAGE}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn start(args: Vec<String>) -> Result<(), SitlError> {
    let config = parse_args(args)?;
    let port = UdpPort::bind(("0.0.0.0", config.port))?;
    println!(
        "wst_sitl: {:?} frame at {} Hz, listening on {}",
        config.frame,
        config.rate_hz,
        port.local_addr()?
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let mut last = None::<LinkHealth>;
    let summary = run(&config, port, shutdown, |report| {
        if last != Some(report.health) {
            println!("[{:>10} us] link {}", report.now_us, report.health);
            last = Some(report.health);
        }
    })
    .await?;

    println!(
        "wst_sitl: {} ticks, {} frames accepted, {} discarded, {} telemetry sent, link {}",
        summary.ticks,
        summary.link.frames_accepted,
        summary.link.frames_discarded,
        summary.link.telemetry_sent,
        summary.health
    );
    Ok(())
}
