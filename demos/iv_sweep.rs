//! IV Sweep Recording Demonstration
//!
//! This example records a synthetic current-voltage sweep the way a bench
//! script would: start a run, start a phase, hand the swept data to the
//! recorder, and get back a CSV table, a chart and a metadata document.
//!
//! Run with: cargo run --example iv_sweep

use anyhow::Result;
use bench_recorder::measurement::Measurement;
use bench_recorder::metadata::{EnvironmentInfo, TestInfo};
use bench_recorder::normalize::{DataInput, MappingValue};
use bench_recorder::session::RunIdentity;
use bench_recorder::{DatasetRequest, Recorder};
use rand::Rng;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== IV Sweep Recording Demo ===\n");

    // 1. Create the recorder rooted at a scratch directory
    let top_dir = std::env::temp_dir().join("bench_recorder_demo");
    println!("1. Creating recorder at {}", top_dir.display());
    let mut recorder = Recorder::create(&top_dir)?;

    // 2. Start a run for one device under test
    println!("2. Starting run for device D-0017");
    let identity = RunIdentity::new("WS2", "TxModule", "B7", "L3", "W12", "D-0017", 1, 1);
    if !recorder.start_run(identity) {
        anyhow::bail!("run could not be started");
    }

    // 3. Synthesize a 51-point IV sweep with measurement noise
    println!("3. Sweeping 0.0 V to 0.5 V in 10 mV steps");
    let mut rng = rand::thread_rng();
    let voltages: Vec<f64> = (0..=50).map(|step| step as f64 * 0.01).collect();
    let currents: Vec<f64> = voltages
        .iter()
        .map(|v| v * 0.02 + rng.gen_range(-1.0..1.0) * 2e-5)
        .collect();

    // 4. Record the sweep as a complete dataset
    println!("4. Recording dataset \"iv_sweep\"");
    recorder.start_phase(1, "iv_sweep");

    let data = DataInput::Mapping(vec![
        ("voltage".to_string(), MappingValue::series(voltages)),
        ("current".to_string(), MappingValue::series(currents)),
    ]);
    let request = DatasetRequest::new(
        "iv_sweep",
        data,
        TestInfo::new("iv_sweep", "fab2_line1", "demo_operator"),
        EnvironmentInfo::new(23.5, 41.0),
    )
    .with_testing_variable("voltage")
    .with_equipment_ids("SMU-01")
    .with_script_version("demo-1.0")
    .with_parameter("sweep_points", serde_json::Value::from(51))
    .with_comments("Synthetic diode, demo data");

    let Some(record) = recorder.record_complete_dataset(request) else {
        anyhow::bail!("dataset was not recorded");
    };

    println!("   CSV:      {}", record.table_path.display());
    for plot in &record.plot_files {
        println!("   Chart:    {}", plot.relative_path);
    }
    println!("   Metadata: {}", record.metadata_path.display());

    println!("\n   Column statistics:");
    for (name, stats) in &record.metadata.basic_statistics {
        println!(
            "   {:>8}: mean {:.4e}, min {:.4e}, max {:.4e}",
            name, stats.mean, stats.min, stats.max
        );
    }

    // 5. Record a short stability log from point measurements
    println!("\n5. Recording dataset \"stability\" from point measurements");
    recorder.start_phase(2, "stability");

    let mut points = Vec::new();
    for sample in 0..10 {
        points.push(
            Measurement::new()
                .with_field("sample", sample as f64)
                .with_field("power_dbm", -3.0 + rng.gen_range(-1.0..1.0) * 0.05),
        );
    }
    let request = DatasetRequest::new(
        "stability",
        points,
        TestInfo::new("stability", "fab2_line1", "demo_operator"),
        EnvironmentInfo::new(23.5, 41.0),
    )
    .with_testing_variable("sample")
    .with_dependent_variables(vec!["power_dbm".into()]);

    if recorder.record_complete_dataset(request).is_some() {
        println!("   ✓ Stability dataset recorded");
    }

    // 6. Close out the run
    recorder.end_run();
    println!("\n6. Run ended");
    println!("\n✓ Demo complete. Files are under {}", top_dir.display());

    Ok(())
}
