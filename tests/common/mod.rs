#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// JSON document in the shape `speedtest-cli --json` prints.
pub fn tool_json(sponsor: &str, ping: f64, download: f64, upload: f64) -> String {
    format!(
        r#"{{"download": {download}, "upload": {upload}, "ping": {ping}, "server": {{"url": "http://{sponsor}.example.test/upload.php", "name": "ExampleCity", "country": "Germany", "sponsor": "{sponsor}", "id": "1"}}, "timestamp": "2024-01-01T12:00:02.834911Z", "bytes_sent": 1, "bytes_received": 2, "share": null}}"#
    )
}

/// Write an executable shell script standing in for the measurement tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A tool that reports the requested server id as sponsor and fails for ids
/// listed in `failing`.
#[cfg(unix)]
pub fn echo_server_tool(dir: &Path, failing: &[u32]) -> PathBuf {
    let fail_cases: String = failing
        .iter()
        .map(|id| format!("  {id}) echo 'not json'; exit 0 ;;\n"))
        .collect();
    let json = tool_json("ISP-$server", 14.5, 123456000.0, 45678000.0).replace('"', "\\\"");
    let body = format!(
        "server=best\n\
         while [ $# -gt 0 ]; do\n\
           if [ \"$1\" = \"--server\" ]; then server=\"$2\"; fi\n\
           shift\n\
         done\n\
         case \"$server\" in\n\
         {fail_cases}\
         esac\n\
         echo \"{json}\""
    );
    fake_tool(dir, "speedtest-cli", &body)
}
