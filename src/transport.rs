//! The datagram transport capability: send a buffer, receive up to a
//! deadline. Production code wraps [`std::net::UdpSocket`]; tests substitute
//! an in-memory transport that can drop, reorder, or duplicate datagrams.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::err::Error;

/// Outcome of a single `recv` attempt, kept distinct from `Result` so a
/// timeout can never be mistaken for a fatal transport error or for a valid
/// zero-length/zero-value datagram.
pub enum RecvOutcome {
    Received { len: usize, from: SocketAddr },
    TimedOut,
}

pub trait Transport {
    fn send_to(&self, buf: &[u8], to: SocketAddr) -> Result<(), Error>;

    fn recv_from(&self, buf: &mut [u8]) -> Result<RecvOutcome, Error>;

    /// Values at or below 10ms are treated as "leave the deadline alone" —
    /// the RTO estimator never produces anything that low in practice, and
    /// this keeps a misconfigured floor from starving the OS poll loop.
    fn set_receive_timeout(&self, timeout: Duration) -> Result<(), Error>;
}

pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr)?;
        Ok(UdpTransport { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, buf: &[u8], to: SocketAddr) -> Result<(), Error> {
        self.socket
            .send_to(buf, to)
            .map_err(|e| Error::TransportFatal(e.to_string()))?;
        Ok(())
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<RecvOutcome, Error> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => Ok(RecvOutcome::Received { len, from }),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(RecvOutcome::TimedOut)
            }
            Err(e) => Err(Error::TransportFatal(e.to_string())),
        }
    }

    fn set_receive_timeout(&self, timeout: Duration) -> Result<(), Error> {
        if timeout <= Duration::from_millis(10) {
            return Ok(());
        }
        self.socket.set_read_timeout(Some(timeout))?;
        Ok(())
    }
}

/// An in-memory transport pair for driving a sender and a receiver against
/// each other without a real socket, with a scriptable drop/duplicate rule
/// on the outbound side of each endpoint.
pub mod fake {
    use std::collections::VecDeque;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use super::{Error, RecvOutcome, Transport};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Rule {
        Deliver,
        Drop,
        Duplicate,
    }

    type Queue = Mutex<VecDeque<Vec<u8>>>;

    pub struct ChannelTransport {
        outgoing: std::sync::Arc<Queue>,
        incoming: std::sync::Arc<Queue>,
        peer_addr: SocketAddr,
        timeout: Mutex<Duration>,
        /// Consumed front-to-back, one entry per `send_to` call. Once
        /// exhausted every further send is delivered normally.
        script: Mutex<VecDeque<Rule>>,
    }

    impl ChannelTransport {
        /// Builds two endpoints wired to each other: `a`'s sends land in
        /// `b`'s receive queue and vice versa.
        pub fn pair(addr_a: SocketAddr, addr_b: SocketAddr) -> (Self, Self) {
            let a_to_b = std::sync::Arc::new(Mutex::new(VecDeque::new()));
            let b_to_a = std::sync::Arc::new(Mutex::new(VecDeque::new()));

            let a = ChannelTransport {
                outgoing: a_to_b.clone(),
                incoming: b_to_a.clone(),
                peer_addr: addr_b,
                timeout: Mutex::new(Duration::from_millis(500)),
                script: Mutex::new(VecDeque::new()),
            };
            let b = ChannelTransport {
                outgoing: b_to_a,
                incoming: a_to_b,
                peer_addr: addr_a,
                timeout: Mutex::new(Duration::from_millis(500)),
                script: Mutex::new(VecDeque::new()),
            };
            (a, b)
        }

        /// Installs a drop/duplicate script applied, in order, one rule per
        /// outbound `send_to` call on this endpoint. Exhausted means
        /// "deliver everything from here on".
        pub fn with_script(mut self, rules: Vec<Rule>) -> Self {
            self.script = Mutex::new(rules.into());
            self
        }
    }

    impl Transport for ChannelTransport {
        fn send_to(&self, buf: &[u8], _to: SocketAddr) -> Result<(), Error> {
            let rule = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Rule::Deliver);

            match rule {
                Rule::Drop => Ok(()),
                Rule::Deliver => {
                    self.outgoing.lock().unwrap().push_back(buf.to_vec());
                    Ok(())
                }
                Rule::Duplicate => {
                    let mut q = self.outgoing.lock().unwrap();
                    q.push_back(buf.to_vec());
                    q.push_back(buf.to_vec());
                    Ok(())
                }
            }
        }

        fn recv_from(&self, buf: &mut [u8]) -> Result<RecvOutcome, Error> {
            let timeout = *self.timeout.lock().unwrap();
            let deadline = Instant::now() + timeout;

            loop {
                if let Some(datagram) = self.incoming.lock().unwrap().pop_front() {
                    let len = datagram.len().min(buf.len());
                    buf[..len].copy_from_slice(&datagram[..len]);
                    return Ok(RecvOutcome::Received {
                        len,
                        from: self.peer_addr,
                    });
                }

                if Instant::now() >= deadline {
                    return Ok(RecvOutcome::TimedOut);
                }

                std::thread::sleep(Duration::from_millis(1));
            }
        }

        fn set_receive_timeout(&self, timeout: Duration) -> Result<(), Error> {
            if timeout <= Duration::from_millis(10) {
                return Ok(());
            }
            *self.timeout.lock().unwrap() = timeout;
            Ok(())
        }
    }
}
