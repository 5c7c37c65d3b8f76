//! In-flight instruction bookkeeping shared by the Ibox, Ebox/Fbox, and
//! Mbox: rename state, the active list, issue queues, and the load/store
//! queues.
//!
//! 1. **Rename:** physical register map, free list, and branch checkpoints.
//! 2. **Active List:** in-flight window with in-order retirement.
//! 3. **Issue Queue:** age-priority wakeup/select for the IQ and FQ.
//! 4. **LSQ:** load/store queues with store-to-load forwarding.

/// In-flight instruction window and in-order retirement.
pub mod active_list;

/// Age-priority issue queue (shared shape for IQ and FQ).
pub mod issue_queue;

/// Load queue and store queue with forwarding.
pub mod lsq;

/// Physical register rename map, free list, and checkpoints.
pub mod rename;
