//! Cbox: the bus controller owning every data movement outside the CPU core.
//!
//! Bcache lookups and fills, victim write-backs, I/O reads and writes, probe
//! responses, and the system port protocol all live here, arbitrated across
//! four queues (MAF, VDB, IOWB, PQ). The main loop drains at most one entry
//! per queue per tick in a fixed order (MAF, VDB, IOWB, PQ, then the IRQ
//! field), so no queue can starve another.
//!
//! Cross-component traffic is explicit: the Mbox and Ibox append requests
//! through `add_maf`/`add_iowb`, and read back completions and probe-driven
//! Dcache state transitions from outboxes drained once per tick. The Cbox
//! keeps its own mirror of the Dcache tags (the CTAG) so probe lookups never
//! contend with the Mbox's Dcache ports.

/// Bcache: direct-mapped second-level cache with a data array.
pub mod bcache;
/// Cbox control and status registers.
pub mod csr;
/// MAF, VDB, IOWB, and PQ ring structures.
pub mod queues;
/// System port command protocol and bus abstraction.
pub mod sysport;

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::LINE_SIZE;
use crate::common::error::InitError;
use crate::config::Config;
use crate::core::cpu::{BistState, CpuState};
use crate::core::units::cache::{CacheSim, LineState};
use crate::stats::SimStats;

use self::bcache::Bcache;
use self::csr::CboxCsrs;
use self::queues::{
    Iowb, IowbAdd, Maf, MafAdd, MafRequester, MafType, ProbeQueue, Vdb, VdbKind,
};
use self::sysport::{
    DataMovement, MemoryBus, NextState, SysCmd, SysDc, SysReq, SystemBus,
};

/// Physical addresses with this bit set reference I/O space rather than
/// cacheable memory.
pub const IO_SPACE_BIT: u64 = 1 << 43;

/// A completion event handed back to the Mbox/Ibox.
#[derive(Clone, Debug)]
pub enum CboxCompletion {
    /// A load's block arrived; `shared` reflects the fill state.
    LoadFill {
        /// In-flight tag of the requesting load.
        tag: u32,
        /// Block base address.
        pa: u64,
        /// The 64-byte block.
        data: [u8; 64],
        /// The fill arrived shared.
        shared: bool,
    },
    /// A store acquired write ownership of its line.
    StoreAck {
        /// In-flight tag of the requesting store.
        tag: u32,
        /// Block base address.
        pa: u64,
    },
    /// A store-conditional's change-to-dirty failed; the store must not
    /// commit.
    StoreFail {
        /// In-flight tag of the requesting store.
        tag: u32,
    },
    /// An Istream fill arrived for the fetch front-end.
    Istream {
        /// Block base address.
        pa: u64,
        /// The 64-byte instruction block.
        data: [u8; 64],
    },
    /// An I/O write buffer drained; the named stores are done.
    IoWriteDone {
        /// In-flight tags of the merged stores.
        tags: Vec<u32>,
    },
    /// The system answered `ReadDataError`; a machine check is due.
    MachineCheck {
        /// Failing block address.
        pa: u64,
    },
}

/// A probe-driven Dcache state transition for the Mbox to apply.
#[derive(Clone, Copy, Debug)]
pub struct DcacheTransition {
    /// Line address.
    pub pa: u64,
    /// Next-state command from the probe.
    pub ns: NextState,
}

/// The Cbox.
pub struct Cbox {
    /// Control and status registers.
    pub csrs: CboxCsrs,
    /// Board-level second-level cache.
    pub bcache: Bcache,
    /// Cbox-private duplicate of the Dcache tag array.
    ctag: CacheSim,
    /// Miss Address File.
    pub maf: Maf,
    /// Victim Data Buffer.
    pub vdb: Vdb,
    /// I/O Write Buffer.
    pub iowb: Iowb,
    /// Probe Queue.
    pub pq: ProbeQueue,
    bus: Box<dyn SystemBus + Send>,
    /// Device IRQ bit field, or-ed in by `set_irq`.
    irq: u64,
    /// Masked IRQ snapshot posted toward the Ibox, taken at most once per
    /// outstanding interrupt.
    posted_irq: Option<u64>,
    /// IRQ enable mask applied before posting.
    pub irq_mask: u64,
    /// Lifecycle state driven by this component's main loop.
    pub state: CpuState,
    /// Built-in self-test sub-state.
    pub bist: BistState,
    completions: VecDeque<CboxCompletion>,
    dcache_transitions: VecDeque<DcacheTransition>,
}

impl Cbox {
    /// Builds the Cbox from the configuration: Bcache geometry from the
    /// `BcSize` CSR equivalent, queue depths from the queue configuration,
    /// and a flat-memory system bus.
    pub fn new(config: &Config) -> Self {
        let mut csrs = CboxCsrs::default();
        let mb = (config.cache.bcache.size_bytes / (1024 * 1024)).clamp(1, 16);
        csrs.bc_size = mb as u64 - 1;
        let bus = MemoryBus::new(
            0,
            config.system.ram_base as usize + config.system.ram_size,
            config.system.system_port_latency,
        );
        Self {
            bcache: Bcache::new(csrs.bcache_bytes()),
            csrs,
            ctag: CacheSim::new(&config.cache.dcache),
            maf: Maf::new(config.queues.maf_depth),
            vdb: Vdb::new(config.queues.vdb_depth),
            iowb: Iowb::new(config.queues.iowb_depth),
            pq: ProbeQueue::new(config.queues.pq_depth),
            bus: Box::new(bus),
            irq: 0,
            posted_irq: None,
            irq_mask: u64::MAX,
            state: CpuState::Cold,
            bist: BistState::SystemReset,
            completions: VecDeque::new(),
            dcache_transitions: VecDeque::new(),
        }
    }

    /// Replaces the system bus (tests substitute a recording or mock bus).
    pub fn set_bus(&mut self, bus: Box<dyn SystemBus + Send>) {
        self.bus = bus;
    }

    /// Applies one CSR-loader name/value pair. `BcSize` reallocates the
    /// Bcache arrays.
    pub fn apply_csr(&mut self, name: &str, value: u64) -> Result<(), InitError> {
        self.csrs.apply(name, value)?;
        if name == "BcSize" {
            self.bcache = Bcache::new(self.csrs.bcache_bytes());
        }
        Ok(())
    }

    /// Installs a boot image of raw instruction words at `pa` and returns
    /// the 16-instruction Icache blocks for the Ibox to install. An empty
    /// image or an unaligned base address fails initialization.
    pub fn boot_image(&mut self, pa: u64, words: &[u32]) -> Result<Vec<(u64, [u32; 16])>, InitError> {
        if words.is_empty() {
            return Err(InitError::InvalidImage("empty image".into()));
        }
        if pa % 4 != 0 {
            return Err(InitError::InvalidImage(format!(
                "unaligned base address {pa:#x}"
            )));
        }
        let mut bytes = Vec::with_capacity(words.len() * 4);
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        self.bus.write_raw(pa, &bytes);

        let mut blocks = Vec::new();
        for (i, chunk) in words.chunks(16).enumerate() {
            let mut block = [0x47FF_041Fu32; 16]; // pad with NOPs
            block[..chunk.len()].copy_from_slice(chunk);
            blocks.push((pa + (i as u64) * LINE_SIZE, block));
        }
        Ok(blocks)
    }

    /// Loads a raw byte image into physical memory (test binaries, data).
    pub fn load_memory(&mut self, pa: u64, data: &[u8]) {
        self.bus.write_raw(pa, data);
    }

    /// Coherent read of raw bytes (fetch path, load path after fill).
    pub fn read_mem(&self, pa: u64, buf: &mut [u8]) {
        self.bus.read_raw(pa, buf);
    }

    /// Coherent write-through of a retired store's bytes: memory and the
    /// Bcache's resident copy both observe it.
    pub fn write_through(&mut self, pa: u64, data: &[u8]) {
        self.bus.write_raw(pa, data);
        self.bcache.update_bytes(pa, data);
    }

    /// Records that the Dcache installed a line, mirroring it in the CTAG.
    pub fn note_dcache_fill(&mut self, pa: u64, state: LineState) {
        let _ = self.ctag.install(pa, state);
    }

    /// Records a Dcache line state change (e.g. a store upgraded it).
    pub fn note_dcache_state(&mut self, pa: u64, state: LineState) {
        let _ = self.ctag.set_line_state(pa, state);
    }

    /// Appends a request to the MAF (Mbox loads/stores, Ibox Istream).
    #[allow(clippy::too_many_arguments)]
    pub fn add_maf(
        &mut self,
        kind: MafType,
        pa: u64,
        mask: u64,
        requester: MafRequester,
        io: bool,
        io_width: u8,
    ) -> MafAdd {
        let result = self.maf.add(
            kind,
            pa,
            mask,
            requester,
            io,
            io_width,
            self.csrs.sysbus_format,
        );
        trace!(?kind, pa, ?result, "maf request");
        result
    }

    /// Appends a device-space store to the I/O write buffer.
    pub fn add_iowb(&mut self, pa: u64, bytes: &[u8], width: u8, store_tag: u32) -> IowbAdd {
        self.iowb
            .add(pa, bytes, width, store_tag, self.csrs.sysbus_format)
    }

    /// Enqueues an incoming coherence probe from the system.
    pub fn probe(&mut self, dm: DataMovement, ns: NextState, pa: u64, id: u8) -> bool {
        self.pq.push(dm, ns, pa, id).is_some()
    }

    /// Clears the probe-valid gate on every VDB entry for `pa`'s block, as
    /// the system's release does once it has drained the victim.
    pub fn release_victims(&mut self, pa: u64) {
        let line = pa & !(LINE_SIZE - 1);
        let indices: Vec<usize> = self.vdb.iter_indices().collect();
        for idx in indices {
            if self.vdb.get(idx).is_some_and(|e| e.pa == line) {
                self.vdb.clear_probe_valid(idx);
            }
        }
    }

    /// Device-side interrupt entry point: or-in the request bits. The
    /// main loop observes, masks, and posts the field toward the Ibox.
    pub fn set_irq(&mut self, flags: u64) {
        self.irq |= flags;
    }

    /// Clears interrupt request bits (device deasserts its line).
    pub fn clear_irq(&mut self, flags: u64) {
        self.irq &= !flags;
    }

    /// The Ibox's retirement-boundary poll: takes the posted interrupt.
    pub fn take_posted_irq(&mut self) -> Option<u64> {
        self.posted_irq.take()
    }

    /// Drains one completion event for the Mbox/Ibox.
    pub fn take_completion(&mut self) -> Option<CboxCompletion> {
        self.completions.pop_front()
    }

    /// Drains one probe-driven Dcache transition for the Mbox.
    pub fn take_dcache_transition(&mut self) -> Option<DcacheTransition> {
        self.dcache_transitions.pop_front()
    }

    /// Whether any queue has work pending (the real main loop's condition
    /// variable predicate).
    pub fn has_work(&self) -> bool {
        !self.maf.is_empty()
            || !self.vdb.is_empty()
            || !self.iowb.is_empty()
            || !self.pq.is_empty()
            || self.irq != 0
    }

    /// Advances the Cbox main loop by one iteration.
    pub fn tick(&mut self, stats: &mut SimStats) {
        match self.state {
            CpuState::Cold => {
                self.state = CpuState::WaitBiST;
                self.bist = BistState::SystemReset;
            }
            CpuState::WaitBiST | CpuState::WaitBiSI => {
                // Component initialization happened at construction; the
                // self-test sequence reduces to declaring success and
                // promoting the whole CPU to Run.
                self.bist = BistState::BistSucceeded;
                self.state = CpuState::Run;
                debug!("cbox: lifecycle -> Run");
            }
            CpuState::Run => {
                stats.record_occupancy("maf", self.maf.len());
                stats.record_occupancy("vdb", self.vdb.len());
                stats.record_occupancy("iowb", self.iowb.len());
                stats.record_occupancy("pq", self.pq.len());
                self.process_maf(stats);
                self.process_vdb();
                self.process_iowb();
                self.process_pq();
                self.process_irq();
            }
            CpuState::FaultReset => {
                self.state = CpuState::WaitBiSI;
                self.bist = BistState::SystemReset;
            }
            CpuState::Sleep | CpuState::ShuttingDown => {}
        }
    }

    /// Requests an orderly shutdown; every component observes the state at
    /// its next iteration.
    pub fn shut_down(&mut self) {
        self.state = CpuState::ShuttingDown;
    }

    fn piggyback_flags(&self, req: &mut SysReq) {
        let outstanding = self
            .maf
            .iter_indices()
            .filter(|&i| self.maf.get(i).is_some_and(|e| e.processed && !e.complete))
            .count();
        req.miss1 = outstanding >= 1;
        req.miss2 = outstanding >= 2;
        if let Some(pq_idx) = self.pq.oldest_unprocessed() {
            if let Some(probe) = self.pq.get(pq_idx) {
                req.cache_hit = self.bcache.valid(probe.pa)
                    || self.ctag.line_state(probe.pa).is_valid();
            }
        }
    }

    fn complete_requesters(&mut self, idx: usize, pa: u64, data: [u8; 64], shared: bool) {
        let Some(entry) = self.maf.get(idx) else {
            return;
        };
        for r in entry.requesters.clone() {
            match r {
                MafRequester::Load(tag) => self.completions.push_back(CboxCompletion::LoadFill {
                    tag,
                    pa,
                    data,
                    shared,
                }),
                MafRequester::Store(tag) => {
                    self.completions.push_back(CboxCompletion::StoreAck { tag, pa });
                }
                MafRequester::Istream => {
                    self.completions.push_back(CboxCompletion::Istream { pa, data });
                }
            }
        }
    }

    /// Builds the system command a MAF entry issues.
    fn maf_command(&self, idx: usize) -> Option<SysCmd> {
        let e = self.maf.get(idx)?;
        Some(match e.kind {
            MafType::LdX if e.io => match e.io_width {
                1 | 2 => SysCmd::ReadBytes,
                4 => SysCmd::ReadLWs,
                _ => SysCmd::ReadQWs,
            },
            MafType::LdX => SysCmd::ReadBlk,
            MafType::Istream => SysCmd::ReadBlkI,
            MafType::StX | MafType::StXC => SysCmd::ReadBlkMod,
            MafType::StXCtd => {
                if e.shared_hint {
                    SysCmd::SharedToDirty
                } else {
                    SysCmd::CleanToDirty
                }
            }
            MafType::StXCCtd => {
                if self.csrs.stc_enable {
                    SysCmd::StcChangeToDirty
                } else if e.shared_hint {
                    SysCmd::SharedToDirty
                } else {
                    SysCmd::CleanToDirty
                }
            }
            MafType::Wh64 => {
                if self.csrs.inval_to_dirty_enable {
                    SysCmd::InvalToDirty
                } else {
                    SysCmd::ReadBlkMod
                }
            }
            MafType::Ecb => SysCmd::Evict,
        })
    }

    fn process_maf(&mut self, stats: &mut SimStats) {
        let Some(idx) = self.maf.oldest_unprocessed() else {
            return;
        };
        let Some(entry) = self.maf.get(idx).cloned() else {
            return;
        };

        // An ECB outside the Bcache, or with eviction disabled, is a no-op.
        if entry.kind == MafType::Ecb {
            if self.csrs.enable_evict && self.bcache.valid(entry.pa) {
                // A dirty victim needs a buffer slot; hold the entry (and
                // the still-resident block) until one frees up.
                if self.vdb.len() == self.vdb.capacity() {
                    return;
                }
                if let Some(victim) = self.bcache.evict(entry.pa) {
                    let _ = self.vdb.push(VdbKind::ToMemory, victim.pa, victim.data, false);
                }
                let mut req = SysReq::block(SysCmd::Evict, entry.pa, idx as u8);
                self.piggyback_flags(&mut req);
                let _ = self.bus.request(req);
            }
            self.maf.free(idx);
            return;
        }

        // A memory-space load/Istream that hits the Bcache completes
        // without touching the system.
        if !entry.io && matches!(entry.kind, MafType::LdX | MafType::Istream) {
            if let Some((data, _dirty, shared)) = self.bcache.read(entry.pa) {
                stats.bcache_hits += 1;
                self.complete_requesters(idx, entry.pa, data, shared);
                self.maf.free(idx);
                return;
            }
            stats.bcache_misses += 1;
        }

        // Fills displace a Bcache victim; make sure the VDB can take it
        // before committing to the transaction.
        let needs_fill = !entry.io
            && matches!(
                entry.kind,
                MafType::LdX | MafType::Istream | MafType::StX | MafType::StXC | MafType::Wh64
            );
        if needs_fill && self.vdb.len() == self.vdb.capacity() {
            return;
        }

        let Some(cmd) = self.maf_command(idx) else {
            return;
        };
        let mut req = SysReq::block(cmd, entry.pa, idx as u8);
        req.mask = entry.mask;
        self.piggyback_flags(&mut req);
        trace!(?cmd, pa = entry.pa, "maf transmit");
        let rsp = self.bus.request(req);

        if let Some(e) = self.maf.get_mut(idx) {
            e.processed = true;
        }
        self.handle_maf_response(idx, entry.pa, rsp, needs_fill);
    }

    fn handle_maf_response(&mut self, idx: usize, pa: u64, rsp: sysport::SysRsp, install: bool) {
        match rsp.dc {
            SysDc::ReadData(_) | SysDc::ReadDataShared(_) | SysDc::ReadDataDirty(_)
            | SysDc::ReadDataSharedDirty(_) => {
                let shared = matches!(
                    rsp.dc,
                    SysDc::ReadDataShared(_) | SysDc::ReadDataSharedDirty(_)
                );
                let data = rsp.data.unwrap_or([0u8; 64]);
                if install {
                    if let Some(victim) = self.bcache.write(pa, &data) {
                        let _ = self.vdb.push(VdbKind::ToMemory, victim.pa, victim.data, false);
                    }
                    if shared {
                        self.bcache.set_shared(pa);
                    } else {
                        self.bcache.clear_shared(pa);
                    }
                }
                self.complete_requesters(idx, pa, data, shared);
                if let Some(e) = self.maf.get_mut(idx) {
                    e.complete = true;
                }
                self.maf.free(idx);
            }
            SysDc::ChangeToDirtySuccess => {
                self.bcache.set_dirty(pa);
                // Loads merged into the upgrade still need the block bytes.
                let mut block = [0u8; 64];
                self.bus.read_raw(pa & !(LINE_SIZE - 1), &mut block);
                self.complete_requesters(idx, pa, block, false);
                self.maf.free(idx);
            }
            SysDc::ChangeToDirtyFail => {
                if let Some(entry) = self.maf.get(idx) {
                    for r in entry.requesters.clone() {
                        if let MafRequester::Store(tag) = r {
                            self.completions.push_back(CboxCompletion::StoreFail { tag });
                        }
                    }
                }
                self.maf.free(idx);
            }
            SysDc::ReadDataError => {
                debug!(pa, "system port read error; raising machine check");
                self.completions.push_back(CboxCompletion::MachineCheck { pa });
                self.maf.free(idx);
            }
            SysDc::WriteData(_) | SysDc::MbDone | SysDc::ReleaseBuffer | SysDc::Nop => {
                self.maf.free(idx);
            }
        }
    }

    fn process_vdb(&mut self) {
        let Some(idx) = self.vdb.oldest_sendable() else {
            return;
        };
        let Some(entry) = self.vdb.get(idx).cloned() else {
            return;
        };
        match entry.kind {
            VdbKind::ToBcache => {
                if let Some(victim) = self.bcache.write(entry.pa, &entry.data) {
                    // The displaced block chains onto the write-back path;
                    // hold this entry if the buffer cannot take it.
                    if self.vdb.push(VdbKind::ToMemory, victim.pa, victim.data, false).is_none() {
                        return;
                    }
                }
                self.vdb.free(idx);
            }
            VdbKind::ToMemory => {
                let req =
                    SysReq::write_block(SysCmd::WrVictimBlk, entry.pa, entry.data, idx as u8);
                trace!(pa = entry.pa, "victim write-back");
                let _ = self.bus.request(req);
                self.vdb.free(idx);
            }
            VdbKind::ProbeResponse => {}
        }
    }

    fn process_iowb(&mut self) {
        let Some(idx) = self.iowb.oldest_unprocessed() else {
            return;
        };
        let Some(entry) = self.iowb.get(idx).cloned() else {
            return;
        };
        let cmd = match entry.width {
            1 | 2 => SysCmd::WrBytes,
            4 => SysCmd::WrLWs,
            _ => SysCmd::WrQWs,
        };
        let mut req = SysReq::write_block(cmd, entry.pa & !(LINE_SIZE - 1), entry.data, idx as u8);
        req.mask = entry.mask;
        let rsp = self.bus.request(req);
        if matches!(rsp.dc, SysDc::WriteData(_) | SysDc::Nop) {
            self.completions
                .push_back(CboxCompletion::IoWriteDone { tags: entry.stores });
            self.iowb.free(idx);
        }
    }

    fn process_pq(&mut self) {
        let Some(idx) = self.pq.head_index() else {
            return;
        };
        let Some(entry) = self.pq.get(idx).cloned() else {
            return;
        };

        if !entry.processed {
            let bc_status = self.bcache.status(entry.pa);
            let dc_state = self.ctag.line_state(entry.pa);
            let hit = bc_status != bcache::STATUS_MISS || dc_state.is_valid();
            let dirty = bc_status & bcache::STATUS_DIRTY != 0 || dc_state.is_dirty();

            let need_data = match entry.dm {
                DataMovement::Nop => false,
                DataMovement::ReadHit => hit,
                DataMovement::ReadDirty => hit && dirty,
                DataMovement::ReadAny => hit,
            };

            if need_data {
                let data = self.bcache.read(entry.pa).map_or_else(
                    || {
                        let mut buf = [0u8; 64];
                        self.bus.read_raw(entry.pa, &mut buf);
                        buf
                    },
                    |(d, ..)| d,
                );
                if let Some(vdb_idx) = self.vdb.push(VdbKind::ProbeResponse, entry.pa, data, true) {
                    if let Some(e) = self.pq.get_mut(idx) {
                        e.vdb = Some(vdb_idx);
                    }
                } else {
                    return; // VDB full: retry next tick
                }
            }

            // Apply the next-state command to every tag mirror at once.
            self.apply_next_state(entry.pa, entry.ns);
            if let Some(e) = self.pq.get_mut(idx) {
                e.maf = self.maf.outstanding_for_line(entry.pa);
                e.processed = true;
            }
            return;
        }

        // Processed: transmit the response once its victim gate is clear.
        let gated = entry
            .vdb
            .is_some_and(|v| self.vdb.get(v).is_some_and(|e| e.probe_valid))
            || (entry.vdb.is_none() && self.vdb.probe_valid_for(entry.pa));
        if gated {
            return;
        }
        let data = entry.vdb.and_then(|v| self.vdb.get(v).map(|e| e.data));
        let mut req = SysReq::block(SysCmd::ProbeResponse, entry.pa, entry.id);
        req.data = data;
        trace!(pa = entry.pa, "probe response");
        let _ = self.bus.request(req);
        if let Some(v) = entry.vdb {
            self.vdb.free(v);
        }
        self.pq.free(idx);
    }

    fn apply_next_state(&mut self, pa: u64, ns: NextState) {
        let (dc_target, bc_op): (Option<LineState>, fn(&mut Bcache, u64)) = match ns {
            NextState::Nop | NextState::Reserved => (None, |_, _| {}),
            NextState::Clean => (Some(LineState::Owned), |bc, pa| {
                bc.clear_dirty(pa);
                bc.clear_shared(pa);
            }),
            NextState::CleanShared => (Some(LineState::Shared), |bc, pa| {
                bc.clear_dirty(pa);
                bc.set_shared(pa);
            }),
            NextState::Transition3 => {
                // Clean if dirty, else unchanged.
                if self.ctag.line_state(pa).is_dirty()
                    || self.bcache.status(pa) & bcache::STATUS_DIRTY != 0
                {
                    (Some(LineState::Owned), |bc: &mut Bcache, pa| bc.clear_dirty(pa))
                } else {
                    (None, |_, _| {})
                }
            }
            NextState::DirtyShared => (Some(LineState::Shared), |bc, pa| {
                bc.set_dirty(pa);
                bc.set_shared(pa);
            }),
            NextState::Invalid => (Some(LineState::Invalid), |bc, pa| {
                let _ = bc.evict(pa);
            }),
            NextState::Transition1 => {
                // Shared if clean, invalid if dirty.
                if self.ctag.line_state(pa).is_dirty()
                    || self.bcache.status(pa) & bcache::STATUS_DIRTY != 0
                {
                    (Some(LineState::Invalid), |bc: &mut Bcache, pa| {
                        let _ = bc.evict(pa);
                    })
                } else {
                    (Some(LineState::Shared), |bc: &mut Bcache, pa| bc.set_shared(pa))
                }
            }
        };

        if let Some(target) = dc_target {
            // Only lines the CTAG actually tracks produce Dcache work; the
            // mirror and the Dcache hold the same set of lines.
            let resident = if target == LineState::Invalid {
                let was_valid = self.ctag.line_state(pa).is_valid();
                let _ = self.ctag.invalidate(pa);
                was_valid
            } else {
                self.ctag.set_line_state(pa, target)
            };
            if resident {
                self.dcache_transitions.push_back(DcacheTransition { pa, ns });
            }
        }
        bc_op(&mut self.bcache, pa);
    }

    fn process_irq(&mut self) {
        if self.irq != 0 && self.posted_irq.is_none() {
            let masked = self.irq & self.irq_mask;
            if masked != 0 {
                debug!(irq = masked, "posting interrupt toward ibox");
                self.posted_irq = Some(masked);
            }
        }
    }
}
