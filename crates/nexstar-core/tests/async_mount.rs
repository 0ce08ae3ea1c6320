use nexstar_core::angle::Angle;
use nexstar_core::async_mount::AsyncMount;
use nexstar_core::mount::Mount;
use nexstar_core::protocol::{ProtocolError, TrackingMode, Transport};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// Replies by command byte; records every frame written
struct EchoingMount {
    pending: VecDeque<u8>,
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl EchoingMount {
    fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                pending: VecDeque::new(),
                frames: Arc::clone(&frames),
            },
            frames,
        )
    }
}

impl Read for EchoingMount {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.pending.pop_front() {
            Some(b) => {
                buf[0] = b;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl Write for EchoingMount {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.frames.lock().unwrap().push(buf.to_vec());
        let reply: &[u8] = match buf[0] {
            b'e' => b"80000000,C0000000",
            b't' => &[1],
            b'K' => &buf[1..2],
            b'J' => b"0",
            _ => b"",
        };
        self.pending.extend(reply.iter().copied());
        self.pending.push_back(b'#');
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for EchoingMount {
    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }
}

fn async_mount() -> (AsyncMount, Arc<Mutex<Vec<Vec<u8>>>>) {
    let (transport, frames) = EchoingMount::new();
    (
        AsyncMount::new(Mount::with_transport(Box::new(transport))),
        frames,
    )
}

#[tokio::test]
async fn test_async_get_ra_dec() {
    let (mount, _) = async_mount();
    let (ra, dec) = mount.get_ra_dec().await.unwrap();
    assert_eq!(ra.hours(), 12.0);
    assert_eq!(dec.value_mod(), 0.75);
}

#[tokio::test]
async fn test_async_commands() {
    let (mount, frames) = async_mount();
    assert_eq!(mount.tracking_mode().await.unwrap(), TrackingMode::AltAz);
    assert!(!mount.is_aligned().await.unwrap());
    mount
        .slew_ra_dec(Angle::from_hours(6.0), Angle::from_degrees(0.0))
        .await
        .unwrap();
    mount.cancel_slew().await.unwrap();
    assert_eq!(
        frames.lock().unwrap().clone(),
        vec![
            b"t".to_vec(),
            b"J".to_vec(),
            b"r40000000,00000000".to_vec(),
            b"M".to_vec(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_callers_share_one_mount() {
    let (mount, frames) = async_mount();
    let mut tasks = Vec::new();
    for i in 0..16u8 {
        let mount = mount.clone();
        tasks.push(tokio::spawn(async move {
            let byte = b'a' + i;
            assert_eq!(mount.echo(byte).await.unwrap(), byte);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(frames.lock().unwrap().len(), 16);
    assert_eq!(mount.blocking().connection().counters().transactions, 16);
}

#[tokio::test]
async fn test_async_errors_propagate() {
    let (mount, _) = async_mount();
    mount.blocking().close().unwrap();
    assert!(matches!(
        mount.get_az_alt().await,
        Err(ProtocolError::NotConnected)
    ));
}
