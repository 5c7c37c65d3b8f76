//! Mbox: load/store execution, the Dcache and its duplicate tag, and the
//! Cbox request/completion protocol.
//!
//! Loads execute as soon as their address operands are ready: the virtual
//! address translates through the DTB, checks the store queue for a
//! forwardable older store, probes the Dcache, and on a miss raises a MAF
//! request. Stores resolve their address and data into the store queue,
//! acquire write ownership of their line (immediately on an exclusive
//! Dcache hit, via a change-to-dirty otherwise), and drain to memory only
//! after retirement — at most two per cycle, in program order.

use tracing::trace;

use crate::common::constants::LINE_SIZE;
use crate::common::error::Trap;
use crate::common::{AccessType, VirtAddr};
use crate::config::Config;
use crate::core::pipeline::active_list::ActiveListTag;
use crate::core::pipeline::issue_queue::IssuedOp;
use crate::core::pipeline::lsq::{ForwardResult, LoadQueue, StoreQueue};
use crate::core::pipeline::rename::PhysReg;
use crate::core::units::cache::{CacheSim, LineState};
use crate::core::units::cbox::queues::{MafAdd, MafRequester, MafType};
use crate::core::units::cbox::sysport::NextState;
use crate::core::units::cbox::{CboxCompletion, DcacheTransition, IO_SPACE_BIT};
use crate::isa::{fp, opcodes};

use super::Cpu;

/// What a load is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadWait {
    /// An older store with a partial overlap (or unresolved address) must
    /// drain first.
    Store,
    /// The MAF was full; the request has not been filed yet.
    Maf,
    /// A fill is outstanding.
    Fill,
}

#[derive(Clone, Copy, Debug)]
struct PendingLoad {
    tag: ActiveListTag,
    dest: Option<PhysReg>,
    fp: bool,
    opcode: u32,
    pa: u64,
    len: u8,
    wait: LoadWait,
}

/// What a store is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StoreWait {
    /// The MAF was full.
    Maf,
    /// A fill or change-to-dirty acknowledgment is outstanding.
    Ack,
}

#[derive(Clone, Copy, Debug)]
struct PendingStore {
    tag: ActiveListTag,
    dest: Option<PhysReg>,
    conditional: bool,
    pa: u64,
    len: u8,
    shared_hit: bool,
    wait: StoreWait,
}

/// Mbox state.
pub struct Mbox {
    /// L1 data cache (state; data lives in the coherent memory image).
    pub dcache: CacheSim,
    /// Duplicate Dcache tag array for snoop lookups.
    pub dtag: CacheSim,
    /// Load queue.
    pub lq: LoadQueue,
    /// Store queue.
    pub sq: StoreQueue,
    pending_loads: Vec<PendingLoad>,
    pending_stores: Vec<PendingStore>,
}

impl Mbox {
    /// Builds the Mbox from the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            dcache: CacheSim::new(&config.cache.dcache),
            dtag: CacheSim::new(&config.cache.dcache),
            lq: LoadQueue::new(config.queues.lq_depth),
            sq: StoreQueue::new(config.queues.sq_depth),
            pending_loads: Vec::new(),
            pending_stores: Vec::new(),
        }
    }

    /// Drops every in-flight request record (pipeline flush).
    pub fn clear_pending(&mut self) {
        self.pending_loads.clear();
        self.pending_stores.clear();
    }
}

impl Cpu {
    /// One Mbox cycle: apply probe transitions, drain Cbox completions,
    /// retry waiting requests, and drain retired stores.
    pub(crate) fn mbox_tick(&mut self) {
        while let Some(t) = self.cbox.take_dcache_transition() {
            self.apply_dcache_transition(t);
        }
        while let Some(c) = self.cbox.take_completion() {
            self.handle_cbox_completion(c);
        }
        self.retry_pending();
        // The store pipe commits up to two retired stores per cycle.
        for _ in 0..2 {
            if !self.drain_one_store() {
                break;
            }
        }
    }

    /// Load execution: address generation, translation, forwarding, Dcache
    /// probe, and (on a miss) the Cbox request.
    pub(crate) fn execute_load(&mut self, op: &IssuedOp, fp: bool) {
        let opcode = op.decoded.opcode;
        let mut va = op.b.wrapping_add_signed(op.decoded.mem_disp);
        if opcode == opcodes::LDQ_U {
            va &= !0x7;
        }
        let len = load_width(opcode);
        if va % u64::from(len) != 0 {
            self.ipr.va = va;
            self.ibox.active.fault(op.tag, Trap::UnalignedAccess(va));
            return;
        }

        let tr = self.mmu.translate(
            VirtAddr::new(va),
            AccessType::Read,
            self.pal_mode,
            self.ipr.dtb_asn,
            self.ipr.spe(),
        );
        if let Some(trap) = tr.trap {
            self.ipr.va = va;
            self.ipr.mm_stat = 0; // read reference
            self.ibox.active.fault(op.tag, trap);
            return;
        }
        let pa = tr.paddr.val();
        self.mbox.lq.set_address(op.tag, pa, len);
        self.ibox.active.set_mem_addr(op.tag, va);

        if matches!(opcode, opcodes::LDL_L | opcodes::LDQ_L) {
            self.lock_line = Some(pa & !(LINE_SIZE - 1));
        }

        let pending = PendingLoad {
            tag: op.tag,
            dest: op.dest,
            fp,
            opcode,
            pa,
            len,
            wait: LoadWait::Store,
        };
        if let Some(waiting) = self.try_load_access(pending) {
            self.mbox.pending_loads.push(waiting);
        }
    }

    /// Attempts to satisfy a load; returns the pending record if it must
    /// wait.
    fn try_load_access(&mut self, mut p: PendingLoad) -> Option<PendingLoad> {
        if p.wait != LoadWait::Fill {
            match self.mbox.sq.forward(p.pa, p.len, p.tag) {
                ForwardResult::Hit(raw) => {
                    let value = format_load(p.opcode, raw);
                    self.finish_load(&p, value);
                    return None;
                }
                ForwardResult::Stall => {
                    p.wait = LoadWait::Store;
                    return Some(p);
                }
                ForwardResult::Miss => {}
            }

            let io = p.pa & IO_SPACE_BIT != 0;
            if !io && self.mbox.dcache.access(p.pa, false) {
                self.stats.dcache_hits += 1;
                let value = format_load(p.opcode, self.read_raw_len(p.pa, p.len));
                self.finish_load(&p, value);
                return None;
            }
            if !io {
                self.stats.dcache_misses += 1;
            }

            let mask = byte_mask(p.pa, p.len);
            match self.cbox.add_maf(
                MafType::LdX,
                p.pa,
                mask,
                MafRequester::Load(p.tag.0),
                io,
                p.len,
            ) {
                MafAdd::Full => {
                    p.wait = LoadWait::Maf;
                    return Some(p);
                }
                _ => {
                    p.wait = LoadWait::Fill;
                    return Some(p);
                }
            }
        }
        Some(p)
    }

    fn finish_load(&mut self, p: &PendingLoad, value: u64) {
        trace!(tag = p.tag.0, pa = p.pa, value, "load complete");
        self.write_prf(p.dest, p.fp, value);
        self.ibox.active.complete(p.tag, value);
        self.mbox.lq.mark_complete(p.tag);
    }

    /// Store execution: address/data resolution into the SQ and line
    /// ownership acquisition.
    pub(crate) fn execute_store(&mut self, op: &IssuedOp) {
        let opcode = op.decoded.opcode;
        let conditional = matches!(opcode, opcodes::STL_C | opcodes::STQ_C);
        let mut va = op.b.wrapping_add_signed(op.decoded.mem_disp);
        if opcode == opcodes::STQ_U {
            va &= !0x7;
        }
        let (data, len) = store_data(opcode, op.a);
        if va % u64::from(len) != 0 {
            self.ipr.va = va;
            self.ibox.active.fault(op.tag, Trap::UnalignedAccess(va));
            return;
        }

        let tr = self.mmu.translate(
            VirtAddr::new(va),
            AccessType::Write,
            self.pal_mode,
            self.ipr.dtb_asn,
            self.ipr.spe(),
        );
        if let Some(trap) = tr.trap {
            self.ipr.va = va;
            self.ipr.mm_stat = 1; // write reference
            self.ibox.active.fault(op.tag, trap);
            return;
        }
        let pa = tr.paddr.val();

        if conditional {
            let line = pa & !(LINE_SIZE - 1);
            let ok = self.lock_line == Some(line);
            self.lock_line = None;
            if !ok {
                // Failed store-conditional: report 0 in Ra, never store.
                self.write_prf(op.dest, false, 0);
                self.ibox.active.complete(op.tag, 0);
                return;
            }
        }

        self.mbox.sq.resolve(op.tag, pa, data, len);
        self.ibox.active.set_mem_addr(op.tag, va);

        if pa & IO_SPACE_BIT != 0 {
            // Device-space stores order at the IOWB after retirement.
            self.store_owned(op.tag, op.dest, conditional);
            return;
        }

        match self.mbox.dcache.line_state(pa) {
            LineState::Modified | LineState::Owned => {
                let _ = self.mbox.dcache.access(pa, true);
                let _ = self.mbox.dtag.set_line_state(pa, LineState::Modified);
                self.cbox.note_dcache_state(pa, LineState::Modified);
                self.store_owned(op.tag, op.dest, conditional);
            }
            shared_or_invalid => {
                let shared_hit = shared_or_invalid == LineState::Shared;
                let kind = match (conditional, shared_hit) {
                    (true, true) => MafType::StXCCtd,
                    (true, false) => MafType::StXC,
                    (false, true) => MafType::StXCtd,
                    (false, false) => MafType::StX,
                };
                let mut pending = PendingStore {
                    tag: op.tag,
                    dest: op.dest,
                    conditional,
                    pa,
                    len,
                    shared_hit,
                    wait: StoreWait::Ack,
                };
                match self.cbox.add_maf(
                    kind,
                    pa,
                    byte_mask(pa, len),
                    MafRequester::Store(op.tag.0),
                    false,
                    len,
                ) {
                    MafAdd::Full => pending.wait = StoreWait::Maf,
                    MafAdd::New(i) | MafAdd::Merged(i) => {
                        if let Some(e) = self.cbox.maf.get_mut(i) {
                            e.shared_hint |= shared_hit;
                        }
                    }
                }
                self.mbox.pending_stores.push(pending);
            }
        }
    }

    /// A store that owns its line may retire; store-conditional reports
    /// success in Ra.
    fn store_owned(&mut self, tag: ActiveListTag, dest: Option<PhysReg>, conditional: bool) {
        self.mbox.sq.mark_complete(tag);
        let result = u64::from(conditional);
        if conditional {
            self.write_prf(dest, false, 1);
        }
        self.ibox.active.complete(tag, result);
    }

    fn retry_pending(&mut self) {
        let loads = std::mem::take(&mut self.mbox.pending_loads);
        for p in loads {
            match p.wait {
                LoadWait::Fill => self.mbox.pending_loads.push(p),
                _ => {
                    if let Some(waiting) = self.try_load_access(p) {
                        self.mbox.pending_loads.push(waiting);
                    }
                }
            }
        }

        let stores = std::mem::take(&mut self.mbox.pending_stores);
        for mut p in stores {
            if p.wait == StoreWait::Maf {
                let kind = match (p.conditional, p.shared_hit) {
                    (true, true) => MafType::StXCCtd,
                    (true, false) => MafType::StXC,
                    (false, true) => MafType::StXCtd,
                    (false, false) => MafType::StX,
                };
                match self.cbox.add_maf(
                    kind,
                    p.pa,
                    byte_mask(p.pa, p.len),
                    MafRequester::Store(p.tag.0),
                    false,
                    p.len,
                ) {
                    MafAdd::Full => {}
                    MafAdd::New(i) | MafAdd::Merged(i) => {
                        if let Some(e) = self.cbox.maf.get_mut(i) {
                            e.shared_hint |= p.shared_hit;
                        }
                        p.wait = StoreWait::Ack;
                    }
                }
            }
            self.mbox.pending_stores.push(p);
        }
    }

    fn handle_cbox_completion(&mut self, completion: CboxCompletion) {
        match completion {
            CboxCompletion::LoadFill { tag, pa, data, shared } => {
                let Some(pos) = self
                    .mbox
                    .pending_loads
                    .iter()
                    .position(|p| p.tag.0 == tag && p.wait == LoadWait::Fill)
                else {
                    return; // requester was flushed; drop the fill
                };
                let p = self.mbox.pending_loads.swap_remove(pos);
                if pa & IO_SPACE_BIT == 0 {
                    self.install_dcache_line(
                        pa,
                        if shared { LineState::Shared } else { LineState::Owned },
                    );
                }

                let offset = (p.pa - (pa & !(LINE_SIZE - 1))) as usize;
                let mut raw = [0u8; 8];
                raw[..p.len as usize].copy_from_slice(&data[offset..offset + p.len as usize]);
                let value = format_load(p.opcode, u64::from_le_bytes(raw));
                self.finish_load(&p, value);
            }
            CboxCompletion::StoreAck { tag, pa } => {
                let Some(pos) = self
                    .mbox
                    .pending_stores
                    .iter()
                    .position(|p| p.tag.0 == tag)
                else {
                    return;
                };
                let p = self.mbox.pending_stores.swap_remove(pos);
                if self.mbox.dcache.line_state(pa).is_valid() {
                    let _ = self.mbox.dcache.set_line_state(pa, LineState::Modified);
                    let _ = self.mbox.dtag.set_line_state(pa, LineState::Modified);
                    self.cbox.note_dcache_state(pa, LineState::Modified);
                } else {
                    self.install_dcache_line(pa, LineState::Modified);
                }
                self.store_owned(p.tag, p.dest, p.conditional);
            }
            CboxCompletion::StoreFail { tag } => {
                let Some(pos) = self
                    .mbox
                    .pending_stores
                    .iter()
                    .position(|p| p.tag.0 == tag)
                else {
                    return;
                };
                let p = self.mbox.pending_stores.swap_remove(pos);
                self.write_prf(p.dest, false, 0);
                self.ibox.active.complete(p.tag, 0);
            }
            CboxCompletion::Istream { pa, data } => {
                let mut words = [0u32; 16];
                for (i, w) in words.iter_mut().enumerate() {
                    let mut bytes = [0u8; 4];
                    bytes.copy_from_slice(&data[i * 4..i * 4 + 4]);
                    *w = u32::from_le_bytes(bytes);
                }
                self.ibox.install_icache_block(pa, &words);
            }
            CboxCompletion::IoWriteDone { .. } => {}
            CboxCompletion::MachineCheck { pa } => {
                // Machine checks ride the interrupt vector with the failing
                // address latched for PALcode.
                self.ipr.va = pa;
                self.ipr.sirr |= 1 << 63;
                let resume = self.pc;
                self.pal_entry(&Trap::Interrupt, resume);
            }
        }
    }

    /// Installs a filled line into the Dcache and both tag mirrors,
    /// spilling any displaced dirty line toward the Bcache.
    fn install_dcache_line(&mut self, pa: u64, state: LineState) {
        let outcome = self.mbox.dcache.install(pa, state);
        if let Some(victim_pa) = outcome.writeback {
            // The victim's bytes are coherent in the memory image; hand
            // them to the VDB so they land in the Bcache.
            let mut block = [0u8; 64];
            self.cbox.read_mem(victim_pa & !(LINE_SIZE - 1), &mut block);
            let _ = self.cbox.vdb.push(
                crate::core::units::cbox::queues::VdbKind::ToBcache,
                victim_pa,
                block,
                false,
            );
        }
        let _ = self.mbox.dtag.install(pa, state);
        self.cbox.note_dcache_fill(pa, state);
    }

    /// Applies a probe's next-state command to the Dcache and DTAG.
    fn apply_dcache_transition(&mut self, t: DcacheTransition) {
        let dirty = self.mbox.dcache.line_state(t.pa).is_dirty();
        let target = match t.ns {
            NextState::Nop | NextState::Reserved => None,
            NextState::Clean => Some(LineState::Owned),
            NextState::CleanShared => Some(LineState::Shared),
            NextState::Transition3 => dirty.then_some(LineState::Owned),
            NextState::DirtyShared => Some(LineState::Shared),
            NextState::Invalid => Some(LineState::Invalid),
            NextState::Transition1 => Some(if dirty {
                LineState::Invalid
            } else {
                LineState::Shared
            }),
        };
        match target {
            Some(LineState::Invalid) => {
                // A probe-invalidated line's lock reservation dies with it.
                if self.lock_line == Some(t.pa & !(LINE_SIZE - 1)) {
                    self.lock_line = None;
                }
                let _ = self.mbox.dcache.invalidate(t.pa);
                let _ = self.mbox.dtag.invalidate(t.pa);
            }
            Some(state) => {
                let _ = self.mbox.dcache.set_line_state(t.pa, state);
                let _ = self.mbox.dtag.set_line_state(t.pa, state);
            }
            None => {}
        }
    }

    /// Drains one retired store to memory (or the IOWB). Returns false when
    /// nothing drained.
    fn drain_one_store(&mut self) -> bool {
        let Some((tag, addr, data, len)) = self.mbox.sq.peek_drain() else {
            return false;
        };
        let io = addr & IO_SPACE_BIT != 0;
        if io && self.cbox.iowb.len() == self.cbox.iowb.capacity() {
            return false; // hold the store until a buffer frees up
        }
        let _ = self.mbox.sq.drain();

        let bytes = data.to_le_bytes();
        if io {
            let _ = self.cbox.add_iowb(addr, &bytes[..len as usize], len, tag.0);
        } else {
            self.cbox.write_through(addr, &bytes[..len as usize]);
            let _ = self.mbox.dcache.access(addr, true);
            let _ = self.mbox.dtag.set_line_state(addr, LineState::Modified);
            self.cbox.note_dcache_state(addr, LineState::Modified);
        }
        true
    }

    fn read_raw_len(&self, pa: u64, len: u8) -> u64 {
        let mut buf = [0u8; 8];
        self.cbox.read_mem(pa, &mut buf[..len as usize]);
        u64::from_le_bytes(buf)
    }
}

/// Access width in bytes for a load opcode.
fn load_width(opcode: u32) -> u8 {
    match opcode {
        opcodes::LDBU => 1,
        opcodes::LDWU => 2,
        opcodes::LDL | opcodes::LDL_L | opcodes::LDS => 4,
        _ => 8,
    }
}

/// Formats raw loaded bytes (zero-extended into a u64) into the register
/// value the opcode delivers.
fn format_load(opcode: u32, raw: u64) -> u64 {
    match opcode {
        opcodes::LDBU => raw & 0xFF,
        opcodes::LDWU => raw & 0xFFFF,
        opcodes::LDL | opcodes::LDL_L => (raw as u32 as i32 as i64) as u64,
        opcodes::LDS => fp::s_mem_to_reg(raw as u32),
        _ => raw,
    }
}

/// Store data (truncated to the access width) and width for a store opcode.
fn store_data(opcode: u32, value: u64) -> (u64, u8) {
    match opcode {
        opcodes::STB => (value & 0xFF, 1),
        opcodes::STW => (value & 0xFFFF, 2),
        opcodes::STL | opcodes::STL_C => (value & 0xFFFF_FFFF, 4),
        opcodes::STS => (u64::from(fp::t_reg_to_s_mem(value)), 4),
        _ => (value, 8),
    }
}

/// Valid-byte mask over a 64-byte block for an access at `pa` of `len`
/// bytes.
fn byte_mask(pa: u64, len: u8) -> u64 {
    let offset = pa & (LINE_SIZE - 1);
    (((1u128 << len) - 1) << offset) as u64
}
