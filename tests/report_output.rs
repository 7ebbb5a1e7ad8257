use chrono::{Local, TimeZone};
use droidcpu::monitor::Recording;
use droidcpu::report::{self, ReportSettings, SpikePolicy};
use std::path::Path;

fn settings(output: &Path, spike: SpikePolicy) -> ReportSettings {
    ReportSettings {
        output: output.to_path_buf(),
        top_k: 8,
        spike,
        app_label: "com.streamtablet".to_string(),
    }
}

fn two_tick_recording() -> Recording {
    let t0 = Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let t1 = Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 2).unwrap();
    let mut rec = Recording::new();
    rec.record(t0, 10.0, &[("A".to_string(), 4.0)]);
    rec.record(t1, 60.0, &[("B".to_string(), 9.0), ("A".to_string(), 5.0)]);
    rec
}

#[test]
fn live_report_writes_chart_and_ranked_csv() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("out.svg");

    let files = report::report_live(&two_tick_recording(), &settings(&chart, SpikePolicy::LIVE_DEFAULT))
        .unwrap()
        .expect("files written");

    assert_eq!(files.chart, chart);
    assert_eq!(files.csv, dir.path().join("out_data.csv"));
    let svg = std::fs::read_to_string(&chart).unwrap();
    assert!(svg.contains("<svg"));

    let csv = std::fs::read_to_string(&files.csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "timestamp,total_cpu,B,A",
            "2024-05-01 10:00:00,10,0,4",
            "2024-05-01 10:00:02,60,9,5",
        ]
    );
}

#[test]
fn top_k_bounds_the_csv_columns() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("cpu.svg");
    let mut settings = settings(&chart, SpikePolicy::Fixed(20.0));
    settings.top_k = 1;

    let files = report::report_live(&two_tick_recording(), &settings)
        .unwrap()
        .expect("files written");

    let csv = std::fs::read_to_string(&files.csv).unwrap();
    assert_eq!(csv.lines().next(), Some("timestamp,total_cpu,B"));
}

#[test]
fn ondevice_report_keeps_raw_csv_beside_chart() {
    let raw_dir = tempfile::tempdir().unwrap();
    let raw = raw_dir.path().join("pulled.csv");
    let raw_text = "timestamp,proc_utime,proc_stime,sys_total,sys_idle\n10:00:00,0,0,0,0\n10:00:02,6,4,100,50\n";
    std::fs::write(&raw, raw_text).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let chart = out_dir.path().join("cpu_ondevice.svg");
    let mut rec = Recording::new();
    rec.record(Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 2).unwrap(), 10.0, &[]);

    let files = report::report_ondevice(&rec, &raw, &settings(&chart, SpikePolicy::ONDEVICE_DEFAULT))
        .unwrap()
        .expect("files written");

    assert!(chart.exists());
    assert_eq!(files.csv, out_dir.path().join("cpu_data.csv"));
    assert_eq!(std::fs::read_to_string(&files.csv).unwrap(), raw_text);
}

#[test]
fn unsupported_extension_is_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    assert!(report::ensure_available(&dir.path().join("cpu.jpg")).is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
