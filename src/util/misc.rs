use std::fmt;

use crate::error;

pub type Res<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9876;

pub fn next_value<T>(it: &mut std::slice::Iter<'_, std::string::String>, opt: &str) -> T
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    let n = it
        .next()
        .unwrap_or_else(|| error_exit(format!("{}: value missing", opt)));
    n.parse()
        .unwrap_or_else(|e| error_exit(format!("{}: {} '{}'", opt, e, n)))
}

pub fn sleep(sec: f64) {
    std::thread::sleep(std::time::Duration::from_millis((sec * 1000.0) as u64));
}

pub fn unixtime_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as f64
        / 1000.0
}

pub fn error_exit<T: fmt::Display, U>(t: T) -> U {
    error!("{}", t);
    std::process::exit(1);
}

// Host/port file: first line host, second line port, both optional.
pub fn read_host_port(path: &str) -> Res<(String, u16)> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines();
    let host = match lines.next() {
        Some(h) if !h.trim().is_empty() => h.trim().to_string(),
        _ => DEFAULT_HOST.to_string(),
    };
    let port = match lines.next() {
        Some(p) if !p.trim().is_empty() => p.trim().parse()?,
        _ => DEFAULT_PORT,
    };
    Ok((host, port))
}

#[test]
fn test_read_host_port() {
    let path = std::env::temp_dir().join("domino_host_port_test");
    let path = path.to_str().unwrap();

    std::fs::write(path, "192.168.0.10\n4000\n").unwrap();
    assert_eq!(
        read_host_port(path).unwrap(),
        ("192.168.0.10".to_string(), 4000)
    );

    std::fs::write(path, "somehost\n").unwrap();
    assert_eq!(
        read_host_port(path).unwrap(),
        ("somehost".to_string(), DEFAULT_PORT)
    );

    std::fs::write(path, "host\nnot-a-port\n").unwrap();
    assert!(read_host_port(path).is_err());
}
