//! Scripted provider used by in-crate tests.
//!
//! Every request sent is recorded; replies are played back from a queue
//! in order, so a test scripts exactly the conversation one activation
//! or read sequence produces.

use std::collections::VecDeque;
use std::io;

use bytes::BytesMut;
use dlcap_proto::codec::{BindAck, ErrorAck, HpPpaAck, InfoAck, OkAck};
use dlcap_transport::{ControlChannel, Result, TransportError};

pub enum Step {
    Control(Vec<u8>),
    Frame { ctl: Vec<u8>, data: Vec<u8> },
    Io(io::ErrorKind),
}

#[derive(Default)]
pub struct FakeChannel {
    pub sent: Vec<Vec<u8>>,
    pub sent_data: Vec<Vec<u8>>,
    pub raw_writes: Vec<Vec<u8>>,
    pub ioctls: Vec<i32>,
    pub flushes: usize,
    pub script: VecDeque<Step>,
    pub ioctl_script: VecDeque<io::Result<Vec<u8>>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_control(&mut self, msg: Vec<u8>) {
        self.script.push_back(Step::Control(msg));
    }

    pub fn push_frame(&mut self, ctl: Vec<u8>, data: Vec<u8>) {
        self.script.push_back(Step::Frame { ctl, data });
    }

    pub fn push_io(&mut self, kind: io::ErrorKind) {
        self.script.push_back(Step::Io(kind));
    }

    pub fn push_ioctl(&mut self, result: io::Result<Vec<u8>>) {
        self.ioctl_script.push_back(result);
    }

    fn next_step(&mut self, what: &str) -> Step {
        self.script
            .pop_front()
            .unwrap_or_else(|| panic!("script exhausted at {what}"))
    }
}

impl ControlChannel for FakeChannel {
    fn send_request(&mut self, _what: &'static str, msg: &[u8]) -> Result<()> {
        self.sent.push(msg.to_vec());
        Ok(())
    }

    fn send_request_with_data(
        &mut self,
        _what: &'static str,
        msg: &[u8],
        data: &[u8],
    ) -> Result<()> {
        self.sent.push(msg.to_vec());
        self.sent_data.push(data.to_vec());
        Ok(())
    }

    fn recv_message(&mut self, what: &'static str, buf: &mut [u8]) -> Result<usize> {
        match self.next_step(what) {
            Step::Control(msg) => {
                let len = msg.len().min(buf.len());
                buf[..len].copy_from_slice(&msg[..len]);
                Ok(len)
            }
            Step::Frame { .. } => panic!("scripted frame where {what} expects control"),
            Step::Io(kind) => Err(TransportError::Io {
                op: what,
                source: kind.into(),
            }),
        }
    }

    fn recv_frame(&mut self, ctl: &mut [u8], data: &mut [u8]) -> Result<usize> {
        match self.next_step("getmsg") {
            Step::Control(msg) => {
                let len = msg.len().min(ctl.len());
                ctl[..len].copy_from_slice(&msg[..len]);
                Ok(0)
            }
            Step::Frame { ctl: c, data: d } => {
                let clen = c.len().min(ctl.len());
                ctl[..clen].copy_from_slice(&c[..clen]);
                let dlen = d.len().min(data.len());
                data[..dlen].copy_from_slice(&d[..dlen]);
                Ok(dlen)
            }
            Step::Io(kind) => Err(TransportError::Io {
                op: "getmsg",
                source: kind.into(),
            }),
        }
    }

    fn write_raw(&mut self, buf: &[u8]) -> Result<usize> {
        self.raw_writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn strioctl(&mut self, cmd: i32, buf: &mut [u8], len: usize) -> Result<usize> {
        self.ioctls.push(cmd);
        match self.ioctl_script.pop_front() {
            None => Ok(len),
            Some(Ok(out)) => {
                let n = out.len().min(buf.len());
                buf[..n].copy_from_slice(&out[..n]);
                Ok(n)
            }
            Some(Err(err)) => Err(TransportError::Io {
                op: "strioctl",
                source: err,
            }),
        }
    }

    fn flush_read(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

pub fn info_ack(mac_type: u32, provider_style: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    InfoAck {
        mac_type,
        provider_style,
    }
    .encode(&mut buf);
    buf.to_vec()
}

pub fn bind_ack(sap: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    BindAck { sap }.encode(&mut buf);
    buf.to_vec()
}

pub fn ok_ack(correct_primitive: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    OkAck { correct_primitive }.encode(&mut buf);
    buf.to_vec()
}

pub fn error_ack(error_primitive: u32, errno: u32, unix_errno: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    ErrorAck {
        error_primitive,
        errno,
        unix_errno,
    }
    .encode(&mut buf);
    buf.to_vec()
}

pub fn hp_ppa_ack(count: u32, offset: u32, length: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    HpPpaAck {
        count,
        offset,
        length,
    }
    .encode(&mut buf);
    buf.to_vec()
}
