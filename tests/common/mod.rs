//! Shared helpers for integration tests.
//!
//! `FakeRedis` speaks just enough RESP for the remote backend: PING, SELECT,
//! CLIENT, SET (with PX), GET, DEL, EXISTS and FLUSHDB. It can be told to
//! drop or stall connections to exercise failure paths.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
    px: Option<u64>,
}

#[derive(Debug, Default)]
struct Shared {
    data: Mutex<HashMap<Vec<u8>, StoredValue>>,
    drop_connections: AtomicBool,
    stall_replies: AtomicBool,
    commands: AtomicUsize,
}

pub struct FakeRedis {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl FakeRedis {
    /// Binds an ephemeral port and serves connections on background threads.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared::default());

        let accept_shared = Arc::clone(&shared);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let shared = Arc::clone(&accept_shared);
                thread::spawn(move || {
                    let _ = serve(stream, &shared);
                });
            }
        });

        Self { addr, shared }
    }

    pub fn url(&self) -> String {
        format!("redis://{}/", self.addr)
    }

    /// Closes every connection on its next command without replying.
    pub fn set_dropping(&self, on: bool) {
        self.shared.drop_connections.store(on, Ordering::SeqCst);
    }

    /// Reads commands but never answers them.
    pub fn set_stalling(&self, on: bool) {
        self.shared.stall_replies.store(on, Ordering::SeqCst);
    }

    /// Millisecond expiry sent with the last SET of `key`.
    pub fn px_of(&self, key: &str) -> Option<u64> {
        self.shared
            .data
            .lock()
            .get(key.as_bytes())
            .and_then(|value| value.px)
    }

    pub fn raw_get(&self, key: &str) -> Option<Vec<u8>> {
        self.shared
            .data
            .lock()
            .get(key.as_bytes())
            .map(|value| value.data.clone())
    }

    pub fn raw_set(&self, key: &str, data: &[u8]) {
        self.shared.data.lock().insert(
            key.as_bytes().to_vec(),
            StoredValue {
                data: data.to_vec(),
                expires_at: None,
                px: None,
            },
        );
    }

    pub fn key_count(&self) -> usize {
        self.shared.data.lock().len()
    }

    pub fn commands_served(&self) -> usize {
        self.shared.commands.load(Ordering::SeqCst)
    }
}

fn serve(stream: TcpStream, shared: &Shared) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    loop {
        let Some(args) = read_command(&mut reader)? else {
            return Ok(());
        };
        if shared.drop_connections.load(Ordering::SeqCst) {
            return Ok(());
        }
        if shared.stall_replies.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_secs(5));
            return Ok(());
        }

        shared.commands.fetch_add(1, Ordering::SeqCst);
        let reply = execute(&args, shared);
        writer.write_all(&reply)?;
        writer.flush()?;
    }
}

/// Reads one RESP array of bulk strings. `None` on a clean EOF.
fn read_command(reader: &mut impl BufRead) -> io::Result<Option<Vec<Vec<u8>>>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let count: usize = line
        .trim_end()
        .strip_prefix('*')
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "expected array"))?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line)?;
        let len: usize = line
            .trim_end()
            .strip_prefix('$')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "expected bulk"))?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf)?;
        buf.truncate(len);
        args.push(buf);
    }
    Ok(Some(args))
}

fn execute(args: &[Vec<u8>], shared: &Shared) -> Vec<u8> {
    let Some(name) = args.first() else {
        return b"-ERR empty command\r\n".to_vec();
    };
    let mut data = shared.data.lock();
    let now = Instant::now();
    data.retain(|_, value| value.expires_at.map_or(true, |at| now < at));

    match name.to_ascii_uppercase().as_slice() {
        b"PING" => b"+PONG\r\n".to_vec(),
        b"SELECT" | b"CLIENT" => b"+OK\r\n".to_vec(),
        b"FLUSHDB" => {
            data.clear();
            b"+OK\r\n".to_vec()
        }
        b"SET" if args.len() >= 3 => {
            let px = match args.get(3) {
                Some(opt) if opt.eq_ignore_ascii_case(b"PX") => args
                    .get(4)
                    .and_then(|ms| std::str::from_utf8(ms).ok())
                    .and_then(|ms| ms.parse::<u64>().ok()),
                _ => None,
            };
            data.insert(
                args[1].clone(),
                StoredValue {
                    data: args[2].clone(),
                    expires_at: px.map(|ms| now + Duration::from_millis(ms)),
                    px,
                },
            );
            b"+OK\r\n".to_vec()
        }
        b"GET" if args.len() == 2 => match data.get(&args[1]) {
            Some(value) => {
                let mut reply = format!("${}\r\n", value.data.len()).into_bytes();
                reply.extend_from_slice(&value.data);
                reply.extend_from_slice(b"\r\n");
                reply
            }
            None => b"$-1\r\n".to_vec(),
        },
        b"DEL" => {
            let removed = args[1..]
                .iter()
                .filter(|key| data.remove(*key).is_some())
                .count();
            format!(":{}\r\n", removed).into_bytes()
        }
        b"EXISTS" => {
            let found = args[1..].iter().filter(|key| data.contains_key(*key)).count();
            format!(":{}\r\n", found).into_bytes()
        }
        _ => b"-ERR unknown command\r\n".to_vec(),
    }
}
