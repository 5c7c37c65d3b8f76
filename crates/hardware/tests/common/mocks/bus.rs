//! System-bus test doubles.
//!
//! `RecordingBus` wraps the flat-memory bus and logs every command the
//! Cbox transmits, so tests can assert on the exact system-port traffic a
//! scenario produces. `MockSystemBus` is a `mockall`-generated double for
//! tests that want strict call expectations instead of a log.

use std::sync::{Arc, Mutex};

use axp21264_core::core::units::cbox::sysport::{
    MemoryBus, SysCmd, SysReq, SysRsp, SystemBus,
};

/// A shared, inspectable log of transmitted commands.
pub type CommandLog = Arc<Mutex<Vec<(SysCmd, u64)>>>;

/// Flat-memory bus that records every `(command, pa)` pair it serves.
pub struct RecordingBus {
    inner: MemoryBus,
    log: CommandLog,
}

impl RecordingBus {
    /// Creates a recording bus over `size` bytes of memory based at zero,
    /// returning the bus and a handle to its command log.
    pub fn new(size: usize) -> (Self, CommandLog) {
        let log: CommandLog = Arc::default();
        (
            Self {
                inner: MemoryBus::new(0, size, 1),
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl SystemBus for RecordingBus {
    fn request(&mut self, req: SysReq) -> SysRsp {
        self.log
            .lock()
            .expect("command log poisoned")
            .push((req.cmd, req.pa));
        self.inner.request(req)
    }

    fn read_raw(&self, pa: u64, buf: &mut [u8]) {
        self.inner.read_raw(pa, buf);
    }

    fn write_raw(&mut self, pa: u64, data: &[u8]) {
        self.inner.write_raw(pa, data);
    }
}

/// Counts log entries matching a command.
pub fn count_cmd(log: &CommandLog, cmd: SysCmd) -> usize {
    log.lock()
        .expect("command log poisoned")
        .iter()
        .filter(|(c, _)| *c == cmd)
        .count()
}

/// Finds the PAs a command was transmitted for, in order.
pub fn pas_for_cmd(log: &CommandLog, cmd: SysCmd) -> Vec<u64> {
    log.lock()
        .expect("command log poisoned")
        .iter()
        .filter(|(c, _)| *c == cmd)
        .map(|(_, pa)| *pa)
        .collect()
}

mockall::mock! {
    /// Strict-expectation mock of the system bus.
    pub SystemBus {}

    impl SystemBus for SystemBus {
        fn request(&mut self, req: SysReq) -> SysRsp;
        fn read_raw(&self, pa: u64, buf: &mut [u8]);
        fn write_raw(&mut self, pa: u64, data: &[u8]);
    }
}
