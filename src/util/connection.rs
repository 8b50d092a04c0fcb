use std::fmt;
use std::io::prelude::*;
use std::io::BufReader;
use std::net::TcpStream;

use tungstenite::protocol::WebSocket;

use crate::util::misc::{sleep, Res};
use crate::{error, warn};

#[derive(Debug)]
pub enum Message {
    Text(String),
    Nop,
    Close,
}

// One accepted client socket, read without blocking so queued outbound frames
// can be flushed between reads. `send` may be called from the owning session
// only; cross-thread delivery goes through the session's outbox channel.
pub trait Connection: Send {
    fn send(&mut self, msg: &str) -> Res;
    fn recv(&mut self) -> Message;
}

impl fmt::Debug for dyn Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dyn Connection")
    }
}

pub fn open_connection(stream: TcpStream, ws: bool) -> Res<Box<dyn Connection>> {
    Ok(if ws {
        Box::new(WsConnection::accept(stream)?)
    } else {
        Box::new(TcpConnection::new(stream)?)
    })
}

// TCP
// Frames are separated by '\n', so a frame must not contain '\n' itself.
pub struct TcpConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    buf: String,
}

impl TcpConnection {
    pub fn new(stream: TcpStream) -> Res<Self> {
        stream.set_nonblocking(true)?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            buf: String::new(),
        })
    }
}

impl Connection for TcpConnection {
    fn send(&mut self, msg: &str) -> Res {
        let mut data = msg.as_bytes().to_vec();
        data.push(b'\n');
        let mut written = 0;
        while written < data.len() {
            match self.writer.write(&data[written..]) {
                Ok(0) => return Err("tcp stream closed".into()),
                Ok(n) => written += n,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => sleep(0.001),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn recv(&mut self) -> Message {
        // a partial line survives in self.buf across WouldBlock returns
        match self.reader.read_line(&mut self.buf) {
            Ok(0) => Message::Close,
            Ok(_) => {
                if self.buf.ends_with('\n') {
                    self.buf.pop();
                }
                Message::Text(std::mem::take(&mut self.buf))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Message::Nop,
            Err(e) => {
                error!("tcp: {}", e);
                Message::Close
            }
        }
    }
}

// websocket
pub struct WsConnection {
    socket: WebSocket<TcpStream>,
}

impl WsConnection {
    // The handshake runs on the still-blocking stream; reads go nonblocking
    // afterwards.
    pub fn accept(stream: TcpStream) -> Res<Self> {
        let socket = tungstenite::accept(stream)?;
        socket.get_ref().set_nonblocking(true)?;
        Ok(Self { socket })
    }
}

impl Connection for WsConnection {
    fn send(&mut self, msg: &str) -> Res {
        use tungstenite::error::Error as WsError;
        use tungstenite::protocol::Message as WsMessage;

        let mut res = self.socket.send(WsMessage::Text(msg.to_string()));
        loop {
            match res {
                Ok(()) => return Ok(()),
                Err(WsError::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    sleep(0.001);
                    res = self.socket.flush();
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn recv(&mut self) -> Message {
        use tungstenite::error::Error as WsError;
        use tungstenite::protocol::Message as WsMessage;

        loop {
            match self.socket.read() {
                Ok(msg) => match msg {
                    WsMessage::Close(_) => {
                        self.socket.send(WsMessage::Close(None)).ok();
                        return Message::Close;
                    }
                    WsMessage::Ping(ping) => {
                        self.socket.send(WsMessage::Pong(ping)).ok();
                    }
                    WsMessage::Text(text) => {
                        return Message::Text(text);
                    }
                    _ => {
                        warn!("ws unhandled message: {:?}", msg);
                    }
                },
                Err(WsError::Io(e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    return Message::Nop;
                }
                Err(e) => {
                    error!("ws: {:?}", e);
                    return Message::Close;
                }
            }
        }
    }
}

#[test]
fn test_tcp_connection() {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (accepted, _) = listener.accept().unwrap();

    let mut server_side = TcpConnection::new(accepted).unwrap();
    let mut client_side = TcpConnection::new(client).unwrap();

    // nothing sent yet
    assert!(matches!(server_side.recv(), Message::Nop));

    client_side.send("hello").unwrap();
    let text = loop {
        match server_side.recv() {
            Message::Text(t) => break t,
            Message::Nop => sleep(0.01),
            Message::Close => panic!("unexpected close"),
        }
    };
    assert_eq!(text, "hello");

    drop(client_side);
    loop {
        match server_side.recv() {
            Message::Close => break,
            Message::Nop => sleep(0.01),
            Message::Text(t) => panic!("unexpected frame: {}", t),
        }
    }
}
