//! End-to-end reproductions of the six lettered scenarios against the
//! public `TraceJitRuntime` API — no internal module reached into directly.

use std::sync::Arc;

use tracejit::bytecode::{Method, Opcode};
use tracejit::config::{ExecutionMode, RuntimeConfig};
use tracejit::interp_state::{JitState, ThreadInterpState};
use tracejit::pc::Pc;
use tracejit::runtime::TraceJitRuntime;

fn config() -> RuntimeConfig {
    RuntimeConfig {
        max_table_entries: 512,
        profile_size: 4096,
        threshold: 40,
        blocking_mode: false,
        execution_mode: ExecutionMode::Jit,
        compiler_high_water: 128,
    }
}

fn loop_body(insns: usize) -> Arc<Method> {
    let mut code: Vec<u8> = (0..insns - 1).map(|_| Opcode::Nop as u8).collect();
    code.push(Opcode::Return as u8);
    Arc::new(Method::from_code(code))
}

/// S1 — cold path: a SelectRequest promotes to TSelect, ten instructions
/// accumulate into a single run, and the run finalizes with `run_end` set
/// once the trace-ending `Return` is reached.
#[test]
fn s1_cold_path_builds_one_run_and_enqueues() {
    let runtime = TraceJitRuntime::new(config()).unwrap();
    let method = loop_body(10);
    let mut state = ThreadInterpState::new(Arc::clone(&method), Pc::from_method_offset(&method, 0));

    // The 40 profile-counter decrements that drive the interpreter to
    // request selection are the interpreter's own concern; here we start
    // from the point checkRequest is actually invoked.
    state.jit_state = JitState::SelectRequest;
    let bail = runtime.check_request(&mut state, false);
    assert!(bail);
    assert_eq!(state.jit_state, JitState::TSelect);

    for i in 0..10 {
        state.pc = Pc::from_method_offset(&method, i);
        let bail = runtime.check_trace_step(&mut state, false);
        assert_eq!(bail, i == 9, "only the final Return should end the trace");
    }

    assert_eq!(state.jit_state, JitState::Normal);
    let stats = runtime.stats();
    assert_eq!(stats.queue_len, 1);
    assert_eq!(stats.exits.tselect_end, 1);
}

/// S2 — chain collision: two PCs with the same primary bucket both get
/// slots, one reached only by walking the chain, and both lookups resolve
/// to their installed native addresses.
#[test]
fn s2_chain_collision_is_reachable_via_chain() {
    let runtime = TraceJitRuntime::new(config()).unwrap();
    let method = loop_body(4);
    let a = Pc(0x1000);
    let b = Pc(a.0 + 512 * 4); // same primary bucket as `a` under capacity 512

    for pc in [a, b] {
        let mut state = ThreadInterpState::new(Arc::clone(&method), pc);
        state.jit_state = JitState::SelectRequest;
        let bail = runtime.check_request(&mut state, false);
        assert!(bail);
        assert_eq!(state.jit_state, JitState::TSelect);
    }

    runtime.set_code_addr(a, 0x10 as *const ()).unwrap();
    runtime.set_code_addr(b, 0x20 as *const ()).unwrap();

    assert_eq!(runtime.get_code_addr(a), Some(0x10 as *const ()));
    assert_eq!(runtime.get_code_addr(b), Some(0x20 as *const ()));

    let stats = runtime.stats();
    assert_eq!(stats.occupied_slots, 2);
    assert_eq!(stats.chained_slots, 1);
}

/// S3 — table full: the fourth distinct PC hashing to the same bucket in a
/// 4-slot table completes a full revolution with no empty slot; the
/// kill-switch fires and no further descriptor is ever enqueued.
#[test]
fn s3_table_full_fires_kill_switch() {
    let mut cfg = config();
    cfg.max_table_entries = 4;
    let runtime = TraceJitRuntime::new(cfg).unwrap();
    let method = loop_body(4);

    let pcs: Vec<Pc> = (0..5).map(|i| Pc(i * 4 * 4 + 4)).collect();
    for (i, pc) in pcs.iter().enumerate() {
        let mut state = ThreadInterpState::new(Arc::clone(&method), *pc);
        state.jit_state = JitState::SelectRequest;
        let bail = runtime.check_request(&mut state, false);
        assert!(bail);
        if i < 4 {
            assert_eq!(state.jit_state, JitState::TSelect);
        } else {
            assert_eq!(state.jit_state, JitState::TSelectAbort);
        }
    }

    assert!(runtime.is_killed());

    // Abort idempotence (invariant 8): no further descriptor is ever
    // enqueued, and the gate now refuses every new request outright.
    let mut state = ThreadInterpState::new(Arc::clone(&method), Pc(9999));
    state.jit_state = JitState::SelectRequest;
    assert!(!runtime.check_request(&mut state, false));
    assert_eq!(runtime.stats().queue_len, 0);
}

/// S4 — debugger attaches mid-trace: the next `check` call aborts the
/// trace, enqueues nothing, and `lookup` keeps returning null while any
/// thread remains suspended.
#[test]
fn s4_debugger_attaching_mid_trace_aborts() {
    let runtime = TraceJitRuntime::new(config()).unwrap();
    let method = loop_body(20);
    let entry = Pc::from_method_offset(&method, 0);
    let mut state = ThreadInterpState::new(Arc::clone(&method), entry);
    state.jit_state = JitState::SelectRequest;
    assert!(runtime.check_request(&mut state, false));
    assert_eq!(state.jit_state, JitState::TSelect);

    state.pc = entry;
    assert!(!runtime.check_trace_step(&mut state, false));

    runtime.debug_flag().set(true);
    state.pc = Pc::from_method_offset(&method, 1);
    let bail = runtime.check_trace_step(&mut state, false);
    assert!(bail);
    assert_eq!(state.jit_state, JitState::TSelectAbort);
    assert_eq!(runtime.stats().queue_len, 0);

    runtime.suspend_registry().enter();
    assert_eq!(runtime.get_code_addr(entry), None);
}

/// S5 — return fall-through: a `Return` opcode is appended to the current
/// run and the step immediately finalizes the descriptor in the same call.
#[test]
fn s5_return_falls_through_to_finalize_in_one_step() {
    let runtime = TraceJitRuntime::new(config()).unwrap();
    let method = loop_body(5);
    let mut state = ThreadInterpState::new(Arc::clone(&method), Pc::from_method_offset(&method, 0));
    state.jit_state = JitState::SelectRequest;
    assert!(runtime.check_request(&mut state, false));

    for i in 0..4 {
        state.pc = Pc::from_method_offset(&method, i);
        assert!(!runtime.check_trace_step(&mut state, false));
    }

    // Instruction 4 is the Return.
    state.pc = Pc::from_method_offset(&method, 4);
    let bail = runtime.check_trace_step(&mut state, false);
    assert!(bail);
    assert_eq!(state.jit_state, JitState::Normal);
    assert_eq!(runtime.stats().queue_len, 1);
}

/// S6 — staleness: once `lastReset` is far enough in the past, the request
/// gate resets the profile and discards the pending request rather than
/// promoting it — the selection restarts once the counters are hot again.
#[test]
fn s6_staleness_resets_profile_and_discards_request() {
    let mut cfg = config();
    cfg.profile_size = 16;
    let runtime = TraceJitRuntime::new(cfg).unwrap();
    let method = loop_body(4);
    let pc = Pc(0x4000);

    std::thread::sleep(std::time::Duration::from_millis(300));

    let mut state = ThreadInterpState::new(Arc::clone(&method), pc);
    state.jit_state = JitState::SelectRequest;
    let bail = runtime.check_request(&mut state, false);

    assert!(bail);
    assert_eq!(state.jit_state, JitState::SelectRequest);
    assert_eq!(runtime.get_code_addr(pc), None);
    assert_eq!(runtime.stats().queue_len, 0);
}

/// Concurrent writers claiming distinct, chain-colliding PCs race against a
/// reader hammering `get_code_addr` the whole time — the reader must never
/// observe a torn or half-published slot (invariants 2 and 3).
#[test]
fn concurrent_claims_and_lookups_never_observe_a_torn_slot() {
    let runtime = TraceJitRuntime::new(config()).unwrap();
    let method = loop_body(4);
    let pcs: Vec<Pc> = (0..8).map(|i| Pc(0x2000 + i * 512 * 4)).collect();

    crossbeam::scope(|scope| {
        let reader_runtime = &runtime;
        let reader_pcs = pcs.clone();
        let reader = scope.spawn(move |_| {
            for _ in 0..2_000 {
                for pc in &reader_pcs {
                    if let Some(addr) = reader_runtime.get_code_addr(*pc) {
                        assert_eq!(addr, (0x1000 + pc.0) as *const ());
                    }
                }
            }
        });

        for pc in &pcs {
            let mut state = ThreadInterpState::new(Arc::clone(&method), *pc);
            state.jit_state = JitState::SelectRequest;
            assert!(runtime.check_request(&mut state, false));
            runtime
                .set_code_addr(*pc, (0x1000 + pc.0) as *const ())
                .unwrap();
        }

        reader.join().unwrap();
    })
    .unwrap();

    for pc in &pcs {
        assert_eq!(runtime.get_code_addr(*pc), Some((0x1000 + pc.0) as *const ()));
    }
    assert_eq!(runtime.stats().chained_slots, pcs.len() - 1);
}
