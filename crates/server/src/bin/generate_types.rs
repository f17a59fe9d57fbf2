//! Run with: cargo run --package server --bin generate-types --features typescript

use std::fs;
use std::path::Path;

fn main() {
    println!("Generating TypeScript types...");

    let out_dir = Path::new("frontend/src/types/generated");

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        bench_core::LogLevel::export_all_to(out_dir).expect("Failed to export LogLevel");
        bench_core::LogEntry::export_all_to(out_dir).expect("Failed to export LogEntry");
        bench_core::Provider::export_all_to(out_dir).expect("Failed to export Provider");
        bench_core::ModelDescriptor::export_all_to(out_dir)
            .expect("Failed to export ModelDescriptor");
        bench_core::ModelStatus::export_all_to(out_dir).expect("Failed to export ModelStatus");
        bench_core::ModelResult::export_all_to(out_dir).expect("Failed to export ModelResult");
        bench_core::SessionStatus::export_all_to(out_dir)
            .expect("Failed to export SessionStatus");
        bench_core::BenchmarkRequest::export_all_to(out_dir)
            .expect("Failed to export BenchmarkRequest");
        bench_core::SessionRollup::export_all_to(out_dir)
            .expect("Failed to export SessionRollup");
        bench_core::SessionSnapshot::export_all_to(out_dir)
            .expect("Failed to export SessionSnapshot");
        bench_core::CompletionSummary::export_all_to(out_dir)
            .expect("Failed to export CompletionSummary");
        bench_core::StreamUpdate::export_all_to(out_dir).expect("Failed to export StreamUpdate");
    }

    println!("TypeScript types generated in {}", out_dir.display());
}
