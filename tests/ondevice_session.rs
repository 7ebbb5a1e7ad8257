use droidcpu::adb::FakeBridge;
use droidcpu::core::Config;
use droidcpu::monitor::Shutdown;
use droidcpu::ondevice::{self, OnDeviceSettings};

const DEVICE_CSV: &str = "\
timestamp,proc_utime,proc_stime,sys_total,sys_idle
10:00:00,0,0,0,0
10:00:02,6,4,100,50
10:00:04,20,5,200,90
";

fn settings() -> OnDeviceSettings {
    OnDeviceSettings {
        duration_secs: 30,
        interval_secs: 2,
    }
}

fn config() -> Config {
    Config {
        cores: 1,
        ..Config::default()
    }
}

#[tokio::test]
async fn completed_run_is_pushed_streamed_and_pulled() {
    let config = config();
    let workdir = tempfile::tempdir().unwrap();
    let shutdown = Shutdown::new();
    let bridge = FakeBridge::new()
        .respond("pidof", ["4321"])
        .stream(["10:00:02,6,4,100,50", "Done"])
        .device_file(&config.device_output, DEVICE_CSV);

    let capture = ondevice::collect(&bridge, &config, &settings(), workdir.path(), &shutdown)
        .await
        .unwrap()
        .expect("capture");

    assert_eq!(capture.recording.process_values(), vec![10.0, 15.0]);
    assert_eq!(std::fs::read_to_string(&capture.raw_csv).unwrap(), DEVICE_CSV);

    let pushed = bridge.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].0, config.device_script);
    assert!(pushed[0].1.contains("PKG=\"com.streamtablet\""));
    assert!(pushed[0].1.contains("DURATION=30"));

    let commands = bridge.commands();
    assert!(commands.contains(&format!("chmod +x {}", config.device_script)));
    assert!(commands.contains(&config.device_script));
    assert!(!commands.iter().any(|c| c.starts_with("pkill")));
}

#[tokio::test]
async fn interrupt_stops_the_script_and_still_pulls() {
    let config = config();
    let workdir = tempfile::tempdir().unwrap();
    let shutdown = Shutdown::new();
    let bridge = FakeBridge::new()
        .respond("pidof", ["4321"])
        .stream(["10:00:02,6,4,100,50", "10:00:04,20,5,200,90", "10:00:06,40,10,300,120"])
        .interrupt_stream_after(1, shutdown.clone())
        .device_file(&config.device_output, DEVICE_CSV);

    let capture = ondevice::collect(&bridge, &config, &settings(), workdir.path(), &shutdown)
        .await
        .unwrap()
        .expect("partial capture");

    let commands = bridge.commands();
    assert!(commands.contains(&"pkill -f cpu_monitor.sh".to_string()));
    let pkill = commands.iter().position(|c| c.starts_with("pkill")).unwrap();
    let pull = commands.iter().position(|c| c.starts_with("pull")).unwrap();
    assert!(pkill < pull);
    assert_eq!(capture.recording.len(), 2);
}

#[tokio::test]
async fn failed_pkill_still_pulls_partial_data() {
    let config = config();
    let workdir = tempfile::tempdir().unwrap();
    let shutdown = Shutdown::new();
    let bridge = FakeBridge::new()
        .respond("pidof", ["4321"])
        .fail("pkill", "device offline")
        .stream(["10:00:02,6,4,100,50", "10:00:04,20,5,200,90"])
        .interrupt_stream_after(1, shutdown.clone())
        .device_file(&config.device_output, DEVICE_CSV);

    let capture = ondevice::collect(&bridge, &config, &settings(), workdir.path(), &shutdown)
        .await
        .unwrap()
        .expect("partial capture");

    assert!(bridge.commands().iter().any(|c| c.starts_with("pull")));
    assert_eq!(capture.recording.process_values(), vec![10.0, 15.0]);
}

#[tokio::test]
async fn app_not_running_skips_the_device_entirely() {
    let config = config();
    let workdir = tempfile::tempdir().unwrap();
    let bridge = FakeBridge::new();

    let capture = ondevice::collect(&bridge, &config, &settings(), workdir.path(), &Shutdown::new())
        .await
        .unwrap();

    assert!(capture.is_none());
    assert!(bridge.pushed().is_empty());
    assert_eq!(bridge.commands(), vec!["pidof com.streamtablet".to_string()]);
}

#[tokio::test]
async fn missing_device_file_yields_no_capture() {
    let config = config();
    let workdir = tempfile::tempdir().unwrap();
    let bridge = FakeBridge::new()
        .respond("pidof", ["4321"])
        .stream(["App not running"]);

    let capture = ondevice::collect(&bridge, &config, &settings(), workdir.path(), &Shutdown::new())
        .await
        .unwrap();
    assert!(capture.is_none());
}
