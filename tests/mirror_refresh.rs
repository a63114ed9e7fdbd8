use alg_welcome::mirrors::{
    LogKind, LogRecord, RefreshSettings, RunRejected, RunState, UpdateCoordinator, UpdateRequest,
};
use alg_welcome::process::{EnvPolicy, ProcessRunner};
use alg_welcome::sink::{ChannelSink, EventSink, RunEvent};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Install a fake refresh tool that records its arguments and runs `body`.
fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("reflector");
    let args_file = dir.join("args");
    let script = format!("#!/bin/sh\necho \"$*\" > '{}'\n{}\n", args_file.display(), body);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn coordinator(
    tool: &Path,
    mirrorlist: &Path,
) -> (UpdateCoordinator, Arc<dyn EventSink>, mpsc::UnboundedReceiver<RunEvent>) {
    let (sink, rx) = ChannelSink::new();
    let sink: Arc<dyn EventSink> = Arc::new(sink);
    let settings = RefreshSettings {
        program: tool.display().to_string(),
        privilege_wrapper: String::new(),
        mirrorlist_path: mirrorlist.display().to_string(),
    };
    let coordinator = UpdateCoordinator::new(
        settings,
        ProcessRunner::new(EnvPolicy::inherit()),
        Arc::downgrade(&sink),
    );
    (coordinator, sink, rx)
}

async fn collect(rx: &mut mpsc::UnboundedReceiver<RunEvent>) -> (Vec<LogRecord>, i32) {
    let mut records = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("run timed out")
            .expect("sink closed");
        match event {
            RunEvent::Log(record) => records.push(record),
            RunEvent::Finished(code) => return (records, code),
        }
    }
}

#[tokio::test]
async fn successful_run_reports_classified_lines_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(
        dir.path(),
        r#"echo "[2024-05-01 10:00:00] INFO: https://a.example.org/arch/  3.10 MiB/s  0.20 s"
echo "[2024-05-01 10:00:01] WARNING: failed to rate http://slow.example.org/" >&2
echo ""
echo "[2024-05-01 10:00:02] INFO: https://b.example.org/arch/  1.05 MiB/s  0.61 s"
exit 0"#,
    );
    let mirrorlist = dir.path().join("mirrorlist");
    let (coordinator, _sink, mut rx) = coordinator(&tool, &mirrorlist);

    let request = UpdateRequest::new(["Germany", "France"]);
    coordinator.start(&request).unwrap();
    let (records, code) = collect(&mut rx).await;
    coordinator.wait();

    assert_eq!(code, 0);
    assert_eq!(coordinator.state(), RunState::Finished(0));

    let kinds: Vec<LogKind> = records.iter().map(LogRecord::kind).collect();
    assert_eq!(
        kinds,
        [
            LogKind::Info,
            LogKind::ServerStat,
            LogKind::Warning,
            LogKind::ServerStat,
            LogKind::Info,
        ]
    );
    assert_eq!(records[0].raw(), format!("Starting {}...", tool.display()));
    assert_eq!(
        records[1],
        LogRecord::ServerStat {
            raw: "https://a.example.org/arch/  3.10 MiB/s  0.20 s".to_string(),
            server: "https://a.example.org/arch/".to_string(),
            rate: "3.10 MiB/s".to_string(),
            time: "0.20 s".to_string(),
        }
    );
    assert_eq!(records[2].raw(), "failed to rate http://slow.example.org/");
    assert_eq!(records[4].raw(), "Update completed successfully!");

    let args = std::fs::read_to_string(dir.path().join("args")).unwrap();
    assert_eq!(
        args.trim(),
        format!(
            "--country Germany,France --protocol https --latest 5 --sort rate \
             --download-timeout 10 --save {} --verbose",
            mirrorlist.display()
        )
    );
}

#[tokio::test]
async fn failing_run_ends_with_error_summary() {
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(
        dir.path(),
        r#"echo "[2024-05-01 10:00:00] ERROR: no mirrors found" >&2
exit 3"#,
    );
    let (coordinator, _sink, mut rx) = coordinator(&tool, &dir.path().join("mirrorlist"));

    coordinator.start(&UpdateRequest::new(["Worldwide"])).unwrap();
    let (records, code) = collect(&mut rx).await;

    assert_eq!(code, 3);
    assert_eq!(records.len(), 3);
    assert_eq!(records[1], LogRecord::Error("no mirrors found".to_string()));
    assert_eq!(records[2], LogRecord::Error("Update failed with code 3".to_string()));
}

#[tokio::test]
async fn second_start_is_rejected_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool(dir.path(), "sleep 1");
    let (coordinator, _sink, mut rx) = coordinator(&tool, &dir.path().join("mirrorlist"));
    let request = UpdateRequest::new(["Japan"]);

    coordinator.start(&request).unwrap();
    assert!(coordinator.is_running());
    assert_eq!(coordinator.start(&request), Err(RunRejected::AlreadyRunning));

    let (_, code) = collect(&mut rx).await;
    assert_eq!(code, 0);

    // A finished run frees the coordinator for the next one
    coordinator.start(&request).unwrap();
    let (records, code) = collect(&mut rx).await;
    assert_eq!(code, 0);
    assert!(matches!(&records[0], LogRecord::Info(msg) if msg.starts_with("Starting")));
}

#[test]
fn dropping_the_coordinator_waits_for_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let tool = fake_tool(
        dir.path(),
        &format!("sleep 0.5; echo done > '{}'", marker.display()),
    );
    let (coordinator, _sink, mut rx) = coordinator(&tool, &dir.path().join("mirrorlist"));

    coordinator.start(&UpdateRequest::new(["Brazil"])).unwrap();
    drop(coordinator);

    assert!(marker.exists());
    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::Finished(code) = event {
            finished = Some(code);
        }
    }
    assert_eq!(finished, Some(0));
}
