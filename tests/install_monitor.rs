use alg_welcome::install::InstallMonitor;
use alg_welcome::process::EnvPolicy;
use std::thread;
use std::time::{Duration, Instant};

fn wait_until_idle(monitor: &InstallMonitor) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while monitor.is_running() {
        assert!(Instant::now() < deadline, "installer never finished");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn concurrent_launches_start_one_installer() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("launches");
    let script = format!("echo launched >> '{}'; sleep 0.5", counter.display());
    let monitor = InstallMonitor::new(
        vec!["sh".to_string(), "-c".to_string(), script],
        EnvPolicy::inherit(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let monitor = monitor.clone();
            thread::spawn(move || monitor.launch())
        })
        .collect();
    let started = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|started| *started)
        .count();

    assert_eq!(started, 1);
    assert!(monitor.poll().running);

    wait_until_idle(&monitor);
    let launches = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(launches.lines().count(), 1);
    assert_eq!(monitor.poll().label, "Install ALG");
}
