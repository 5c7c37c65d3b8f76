//! System port command protocol: the Cbox's interface to the outside world.
//!
//! Two directional command classes cross the port. CPU-to-system commands
//! carry Bcache misses, victim write-backs, I/O reads/writes, and probe
//! responses; system-to-CPU responses carry a data-transfer code (`SysDc`)
//! plus an optional 64-byte payload, and reference the originating
//! MAF/VDB/IOWB/PQ entry by ID. Incoming coherence probes carry a
//! data-movement request crossed with a next-state command.
//!
//! The [`SystemBus`] trait abstracts the channel. The in-tree
//! implementation, [`MemoryBus`], answers every command synchronously from
//! a flat physical memory — enough to exercise the Cbox's queue draining
//! and completion signaling without modeling a chipset.

use crate::soc::SystemPort;

/// CPU-to-system command tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)] // Tag values mirror the 21264 system port command set.
pub enum SysCmd {
    Nop,
    ProbeResponse,
    NzNop,
    VdbFlushRequest,
    WrVictimBlk,
    CleanVictimBlk,
    Evict,
    Mb,
    ReadBytes,
    ReadLWs,
    ReadQWs,
    ReadWs,
    WrBytes,
    WrLWs,
    WrQWs,
    ReadBlk,
    ReadBlkMod,
    ReadBlkI,
    FetchBlk,
    ReadBlkSpec,
    ReadBlkModSpec,
    ReadBlkSpecI,
    FetchBlkSpec,
    ReadBlkVic,
    ReadBlkModVic,
    ReadBlkVicI,
    InvalToDirtyVic,
    CleanToDirty,
    SharedToDirty,
    StcChangeToDirty,
    InvalToDirty,
}

/// System-to-CPU data-transfer codes.
///
/// The numeric suffix on the data-carrying codes selects which 16-byte
/// sub-block arrives first on the real pin bus; this implementation always
/// transfers whole blocks and uses variant 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SysDc {
    Nop,
    ReleaseBuffer,
    ReadData(u8),
    ReadDataDirty(u8),
    ReadDataShared(u8),
    ReadDataSharedDirty(u8),
    WriteData(u8),
    MbDone,
    ChangeToDirtySuccess,
    ChangeToDirtyFail,
    ReadDataError,
}

/// Probe data-movement request: what data, if any, the system wants back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataMovement {
    /// No data requested.
    #[default]
    Nop,
    /// Return data if the line hits in any cache.
    ReadHit,
    /// Return data only if the line is dirty.
    ReadDirty,
    /// Return data regardless of state.
    ReadAny,
}

/// Probe next-state command: the state the line must transition to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NextState {
    /// Leave the line's state unchanged.
    #[default]
    Nop,
    /// Transition to clean (exclusive, not dirty).
    Clean,
    /// Transition to clean-shared.
    CleanShared,
    /// Transition 3: clean if dirty, else no change.
    Transition3,
    /// Transition to dirty-shared.
    DirtyShared,
    /// Invalidate the line.
    Invalid,
    /// Transition 1: shared if clean, invalid if dirty.
    Transition1,
    /// Reserved encoding; treated as no change.
    Reserved,
}

/// A CPU-to-system request.
#[derive(Clone, Debug)]
pub struct SysReq {
    /// Command tag.
    pub cmd: SysCmd,
    /// Physical address (64-byte aligned for block commands).
    pub pa: u64,
    /// Block payload for write commands.
    pub data: Option<[u8; 64]>,
    /// Valid-byte mask for sub-block (I/O) commands, one bit per byte.
    pub mask: u64,
    /// ID of the originating MAF/VDB/IOWB/PQ entry, echoed in the response.
    pub id: u8,
    /// A miss is outstanding in the first MAF probe slot.
    pub miss1: bool,
    /// A second miss is outstanding.
    pub miss2: bool,
    /// The oldest unprocessed probe hit a resident line.
    pub cache_hit: bool,
}

impl SysReq {
    /// Builds a block-granularity request with no payload.
    pub fn block(cmd: SysCmd, pa: u64, id: u8) -> Self {
        Self {
            cmd,
            pa,
            data: None,
            mask: u64::MAX,
            id,
            miss1: false,
            miss2: false,
            cache_hit: false,
        }
    }

    /// Builds a write request carrying a full 64-byte block.
    pub fn write_block(cmd: SysCmd, pa: u64, data: [u8; 64], id: u8) -> Self {
        Self {
            data: Some(data),
            ..Self::block(cmd, pa, id)
        }
    }
}

/// A system-to-CPU response.
#[derive(Clone, Debug)]
pub struct SysRsp {
    /// Data-transfer code.
    pub dc: SysDc,
    /// Block payload for read responses.
    pub data: Option<[u8; 64]>,
    /// Echo of the request ID.
    pub id: u8,
}

/// The directional channel between the Cbox and the system.
///
/// `request` models the transactional command protocol. `read_raw` and
/// `write_raw` are the functional backdoor the cycle-approximate simulator
/// uses for coherent data movement (fetch-stream reads, store write-through)
/// that the real machine performs through the same wires over many cycles.
pub trait SystemBus {
    /// Submits one command and returns the system's response.
    fn request(&mut self, req: SysReq) -> SysRsp;

    /// Reads raw bytes from physical memory.
    fn read_raw(&self, pa: u64, buf: &mut [u8]);

    /// Writes raw bytes to physical memory.
    fn write_raw(&mut self, pa: u64, data: &[u8]);
}

/// Flat-memory system bus: answers every command synchronously from a DRAM
/// buffer, standing in for the memory controller and I/O chipset.
pub struct MemoryBus {
    port: SystemPort,
}

impl MemoryBus {
    /// Creates a bus over `size` bytes of flat memory based at `base`.
    pub fn new(base: u64, size: usize, latency: u64) -> Self {
        Self {
            port: SystemPort::new(base, size, latency),
        }
    }

    /// Loads a raw image into the backing memory (boot-time installation).
    pub fn load_image(&mut self, pa: u64, data: &[u8]) {
        self.port.load_image(pa, data);
    }
}

impl SystemBus for MemoryBus {
    fn request(&mut self, req: SysReq) -> SysRsp {
        let id = req.id;
        match req.cmd {
            SysCmd::ReadBlk
            | SysCmd::ReadBlkI
            | SysCmd::ReadBlkSpec
            | SysCmd::ReadBlkSpecI
            | SysCmd::ReadBlkVic
            | SysCmd::ReadBlkVicI
            | SysCmd::FetchBlk
            | SysCmd::FetchBlkSpec
            | SysCmd::ReadBytes
            | SysCmd::ReadLWs
            | SysCmd::ReadQWs
            | SysCmd::ReadWs => SysRsp {
                dc: SysDc::ReadData(0),
                data: Some(self.port.read_line(req.pa & !0x3F)),
                id,
            },
            SysCmd::ReadBlkMod | SysCmd::ReadBlkModSpec | SysCmd::ReadBlkModVic => SysRsp {
                // Block handed over for modification: not shared, not dirty
                // in memory's books.
                dc: SysDc::ReadData(0),
                data: Some(self.port.read_line(req.pa & !0x3F)),
                id,
            },
            SysCmd::WrVictimBlk | SysCmd::CleanVictimBlk => {
                if let Some(block) = req.data {
                    self.port.write_line(req.pa & !0x3F, &block);
                }
                SysRsp {
                    dc: SysDc::WriteData(0),
                    data: None,
                    id,
                }
            }
            SysCmd::WrBytes | SysCmd::WrLWs | SysCmd::WrQWs => {
                if let Some(block) = req.data {
                    let base = req.pa & !0x3F;
                    for i in 0..64u64 {
                        if req.mask & (1 << i) != 0 {
                            self.port.write_bytes(base + i, &block[i as usize..=i as usize]);
                        }
                    }
                }
                SysRsp {
                    dc: SysDc::WriteData(0),
                    data: None,
                    id,
                }
            }
            SysCmd::CleanToDirty
            | SysCmd::SharedToDirty
            | SysCmd::StcChangeToDirty
            | SysCmd::InvalToDirty
            | SysCmd::InvalToDirtyVic => SysRsp {
                dc: SysDc::ChangeToDirtySuccess,
                data: None,
                id,
            },
            SysCmd::Mb => SysRsp {
                dc: SysDc::MbDone,
                data: None,
                id,
            },
            SysCmd::ProbeResponse
            | SysCmd::Evict
            | SysCmd::VdbFlushRequest
            | SysCmd::Nop
            | SysCmd::NzNop => SysRsp {
                dc: SysDc::Nop,
                data: None,
                id,
            },
        }
    }

    fn read_raw(&self, pa: u64, buf: &mut [u8]) {
        self.port.read_bytes(pa, buf);
    }

    fn write_raw(&mut self, pa: u64, data: &[u8]) {
        self.port.write_bytes(pa, data);
    }
}
