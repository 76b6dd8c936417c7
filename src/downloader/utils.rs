// Helper functions for running external tools

use std::io::{self, BufRead, Read};
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run command with timeout (shared utility).
///
/// The child is killed when the deadline passes and an error of kind
/// `TimedOut` is returned. Spawn failures keep their original kind, so a
/// missing binary shows up as `NotFound`.
pub fn run_output_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> io::Result<Output> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout_task = drain(child.stdout.take());
    let stderr_task = drain(child.stderr.take());

    match wait_with_deadline(&mut child, timeout)? {
        Some(status) => {
            let stdout = stdout_task.join().unwrap_or_default();
            let stderr = stderr_task.join().unwrap_or_default();
            Ok(Output { status, stdout, stderr })
        }
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} timed out after {:?}", program.display(), timeout),
            ))
        }
    }
}

/// Call `f` with every line of `reader` until EOF.
///
/// Lines are split on raw bytes and decoded lossily, so output in a
/// non-UTF-8 code page does not stop the read. Stopping early would close
/// the pipe under a still-running child.
pub fn for_each_line_lossy<R: BufRead>(mut reader: R, mut f: impl FnMut(&str)) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                f(line.trim_end_matches(['\n', '\r']));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

/// Last lines of tool output, for error messages
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
