//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the Alpha AXP 21264 simulator. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions, and derived metrics (CPI, MIPS).
//! 2. **Instruction mix:** Counts by category (integer, load, store, branch, PAL, FP).
//! 3. **Branch prediction:** Lookups, mispredictions, and accuracy.
//! 4. **Stalls:** Memory, control, and data hazard stall counts.
//! 5. **Cache hierarchy:** Hit/miss counts for Icache, Dcache, and Bcache.
//! 6. **Queue occupancy:** High-water marks for the Cbox's MAF/VDB/IOWB/PQ.

use std::time::Instant;

/// Simulation statistics structure tracking all performance metrics.
///
/// Collects detailed statistics about instruction execution, cache behavior,
/// branch prediction, stalls, and execution time for performance analysis.
#[derive(Clone)]
pub struct SimStats {
    start_time: Instant,
    /// Total simulator cycles elapsed.
    pub cycles: u64,
    /// Number of instructions retired.
    pub instructions_retired: u64,

    /// Count of integer load instructions retired.
    pub inst_load: u64,
    /// Count of integer store instructions retired.
    pub inst_store: u64,
    /// Count of branch/jump instructions retired.
    pub inst_branch: u64,
    /// Count of integer operate instructions retired.
    pub inst_integer: u64,
    /// Count of PALcode entries (`CALL_PAL`) retired.
    pub inst_pal: u64,

    /// Count of floating-point load instructions retired.
    pub inst_fp_load: u64,
    /// Count of floating-point store instructions retired.
    pub inst_fp_store: u64,
    /// Count of FP arithmetic instructions retired.
    pub inst_fp_arith: u64,
    /// Count of FP divide/square-root instructions retired.
    pub inst_fp_div_sqrt: u64,

    /// Number of branch predictions that were correct.
    pub branch_predictions: u64,
    /// Number of branch predictions that were wrong (mispredictions).
    pub branch_mispredictions: u64,

    /// Cycles spent in Kernel mode.
    pub cycles_kernel: u64,
    /// Cycles spent in User mode.
    pub cycles_user: u64,
    /// Cycles spent executing PALcode (`PS<PALmode>` set).
    pub cycles_pal: u64,

    /// Stall cycles due to memory (cache/Cbox not ready).
    pub stalls_mem: u64,
    /// Stall cycles due to control hazards (branch resolution, flush).
    pub stalls_control: u64,
    /// Stall cycles due to data hazards (physical register not yet valid).
    pub stalls_data: u64,

    /// Number of traps (exceptions or interrupts) taken.
    pub traps_taken: u64,

    /// Icache hit count.
    pub icache_hits: u64,
    /// Icache miss count.
    pub icache_misses: u64,
    /// Dcache hit count.
    pub dcache_hits: u64,
    /// Dcache miss count.
    pub dcache_misses: u64,
    /// Bcache hit count.
    pub bcache_hits: u64,
    /// Bcache miss count.
    pub bcache_misses: u64,

    /// Highest observed MAF occupancy.
    pub maf_high_water: usize,
    /// Highest observed VDB occupancy.
    pub vdb_high_water: usize,
    /// Highest observed IOWB occupancy.
    pub iowb_high_water: usize,
    /// Highest observed PQ occupancy.
    pub pq_high_water: usize,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            inst_integer: 0,
            inst_pal: 0,
            inst_fp_load: 0,
            inst_fp_store: 0,
            inst_fp_arith: 0,
            inst_fp_div_sqrt: 0,
            branch_predictions: 0,
            branch_mispredictions: 0,
            cycles_kernel: 0,
            cycles_user: 0,
            cycles_pal: 0,
            stalls_mem: 0,
            stalls_control: 0,
            stalls_data: 0,
            traps_taken: 0,
            icache_hits: 0,
            icache_misses: 0,
            dcache_hits: 0,
            dcache_misses: 0,
            bcache_hits: 0,
            bcache_misses: 0,
            maf_high_water: 0,
            vdb_high_water: 0,
            iowb_high_water: 0,
            pq_high_water: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"core"`, `"instruction_mix"`, `"branch"`,
/// `"memory"`, `"queues"`. Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &[
    "summary",
    "core",
    "instruction_mix",
    "branch",
    "memory",
    "queues",
];

impl SimStats {
    /// Records a new occupancy sample against a queue's high-water mark.
    pub fn record_occupancy(&mut self, queue: &str, occupancy: usize) {
        let slot = match queue {
            "maf" => &mut self.maf_high_water,
            "vdb" => &mut self.vdb_high_water,
            "iowb" => &mut self.iowb_high_water,
            "pq" => &mut self.pq_high_water,
            _ => return,
        };
        if occupancy > *slot {
            *slot = occupancy;
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of the names in `STATS_SECTIONS`.
    /// Pass an empty slice to print all sections (same as `print()`).
    ///
    /// # Panics
    ///
    /// This function will not panic. `cyc`/`instr` are floored at 1 before any
    /// division, so a zero-cycle or zero-retirement run prints zeroed rates
    /// rather than dividing by zero.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let duration = self.start_time.elapsed();
        let seconds = duration.as_secs_f64();
        let cyc = self.cycles.max(1);
        let instr = self.instructions_retired.max(1);

        if want("summary") {
            let ipc = self.instructions_retired as f64 / cyc as f64;
            let cpi = cyc as f64 / instr as f64;
            let mips = (self.instructions_retired as f64 / seconds) / 1_000_000.0;
            let khz = (self.cycles as f64 / seconds) / 1000.0;
            println!("\n==========================================================");
            println!("ALPHA AXP 21264 SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {:.4} s", seconds);
            println!("sim_cycles               {}", self.cycles);
            println!("sim_freq                 {:.2} kHz", khz);
            println!("sim_insts                {}", self.instructions_retired);
            println!("sim_ipc                  {:.4}", ipc);
            println!("sim_cpi                  {:.4}", cpi);
            println!("sim_mips                 {:.2}", mips);
            println!("----------------------------------------------------------");
        }
        if want("core") {
            println!("CORE BREAKDOWN");
            println!(
                "  cycles.kernel          {} ({:.2}%)",
                self.cycles_kernel,
                (self.cycles_kernel as f64 / cyc as f64) * 100.0
            );
            println!(
                "  cycles.user            {} ({:.2}%)",
                self.cycles_user,
                (self.cycles_user as f64 / cyc as f64) * 100.0
            );
            println!(
                "  cycles.pal             {} ({:.2}%)",
                self.cycles_pal,
                (self.cycles_pal as f64 / cyc as f64) * 100.0
            );
            println!(
                "  stalls.memory          {} ({:.2}%)",
                self.stalls_mem,
                (self.stalls_mem as f64 / cyc as f64) * 100.0
            );
            println!(
                "  stalls.control         {} ({:.2}%)",
                self.stalls_control,
                (self.stalls_control as f64 / cyc as f64) * 100.0
            );
            println!(
                "  stalls.data            {} ({:.2}%)",
                self.stalls_data,
                (self.stalls_data as f64 / cyc as f64) * 100.0
            );
            println!("  traps.taken            {}", self.traps_taken);
            println!("----------------------------------------------------------");
        }
        if want("instruction_mix") {
            let total_inst = instr as f64;
            println!("INSTRUCTION MIX");
            println!(
                "  op.integer             {} ({:.2}%)",
                self.inst_integer,
                (self.inst_integer as f64 / total_inst) * 100.0
            );
            println!(
                "  op.load                {} ({:.2}%)",
                self.inst_load,
                (self.inst_load as f64 / total_inst) * 100.0
            );
            println!(
                "  op.store               {} ({:.2}%)",
                self.inst_store,
                (self.inst_store as f64 / total_inst) * 100.0
            );
            println!(
                "  op.branch              {} ({:.2}%)",
                self.inst_branch,
                (self.inst_branch as f64 / total_inst) * 100.0
            );
            println!(
                "  op.pal                 {} ({:.2}%)",
                self.inst_pal,
                (self.inst_pal as f64 / total_inst) * 100.0
            );
            println!(
                "  op.fp_arith            {} ({:.2}%)",
                self.inst_fp_arith,
                (self.inst_fp_arith as f64 / total_inst) * 100.0
            );
            println!("----------------------------------------------------------");
        }
        if want("branch") {
            let bp_correct = self.branch_predictions;
            let bp_miss = self.branch_mispredictions;
            let bp_total = bp_correct + bp_miss;
            let bp_acc = if bp_total > 0 {
                100.0 * (bp_correct as f64 / bp_total as f64)
            } else {
                0.0
            };
            println!("BRANCH PREDICTION");
            println!("  bp.lookups             {}", bp_total);
            println!("  bp.mispredicts         {}", bp_miss);
            println!("  bp.accuracy            {:.2}%", bp_acc);
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            let print_cache = |name: &str, hits: u64, misses: u64| {
                let total = hits + misses;
                let rate = if total > 0 {
                    (hits as f64 / total as f64) * 100.0
                } else {
                    0.0
                };
                println!(
                    "  {:<6} accesses: {:<10} | hits: {:<10} | miss_rate: {:.2}%",
                    name,
                    total,
                    hits,
                    100.0 - rate
                );
            };
            println!("MEMORY HIERARCHY");
            print_cache("Icache", self.icache_hits, self.icache_misses);
            print_cache("Dcache", self.dcache_hits, self.dcache_misses);
            print_cache("Bcache", self.bcache_hits, self.bcache_misses);
            println!("----------------------------------------------------------");
        }
        if want("queues") {
            println!("CBOX QUEUE HIGH-WATER MARKS");
            println!("  maf                    {}", self.maf_high_water);
            println!("  vdb                    {}", self.vdb_high_water);
            println!("  iowb                   {}", self.iowb_high_water);
            println!("  pq                     {}", self.pq_high_water);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout. Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
