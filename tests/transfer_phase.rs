mod tests {
    use hexstrip::sim::{CLOCK_CHANNEL, PortAccess, SimBus, Writer};
    use hexstrip::{EngineConfig, InterruptSlot, TransferPhase, TransferState, init};

    #[test]
    fn test_phases_follow_hardware_pipeline() {
        let bus = SimBus::new();
        bus.set_autorun(false);
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(8, 0x0001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);
        bus.clear_trace();

        assert_eq!(gate.phase(), TransferPhase::Idle);
        assert!(!gate.busy());

        let mut frame = [0xAAAA_u16; 4];
        // SAFETY: `frame` outlives the transfer, which is finished below.
        unsafe { gate.start(&mut frame).unwrap() };

        // armed and released, but nothing clocked out yet
        assert!(state.is_active());
        for _ in 0..100 {
            assert!(gate.busy());
            assert_eq!(gate.phase(), TransferPhase::Active);
        }
        bus.with_trace(|events| assert!(events.is_empty()));

        assert!(bus.run_pending());
        assert!(bus.interrupt_pending(CLOCK_CHANNEL));
        // the pass is done but the interrupt has not run yet
        assert_eq!(gate.phase(), TransferPhase::Active);
        assert_eq!(bus.level(), 0xAAAB);

        assert!(slot.dispatch());
        assert!(!bus.interrupt_pending(CLOCK_CHANNEL));
        assert!(!state.is_active());
        assert_eq!(bus.level(), 0xFFFE);
        assert_eq!(gate.phase(), TransferPhase::Latching);
        assert!(gate.busy());

        bus.advance(900_000);
        assert!(gate.busy());
        bus.advance(200_000);
        assert!(!gate.busy());
        assert_eq!(gate.phase(), TransferPhase::Idle);

        bus.with_trace(|events| {
            let last = events.last().unwrap();
            assert_eq!((last.writer, last.access), (Writer::Cpu, PortAccess::Write(0xFFFE)));
        });
    }

    #[test]
    fn test_wait_idle_returns_after_latch_interval() {
        let bus = SimBus::new();
        bus.set_autorun(false);
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(4, 0x0001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);

        let mut frame = [0x0006_u16; 2];
        // SAFETY: `frame` outlives the transfer, which is finished below.
        unsafe { gate.start(&mut frame).unwrap() };
        assert!(bus.run_pending());
        assert!(slot.dispatch());

        let done = state.completed_at().unwrap();
        gate.wait_idle();
        let now = hexstrip::Instant::from_micros(bus.now_nanos() / 1000);
        assert!(now.duration_since(done) >= config.latch_delay);
        assert_eq!(gate.phase(), TransferPhase::Idle);
    }

    #[test]
    fn test_dispatch_on_empty_slot() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(4, 0x0001, false, 1_000_000);
        let (_gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();

        assert!(!slot.dispatch());
        assert!(slot.install(handler).is_none());
        assert!(slot.dispatch());
        assert!(slot.take().is_some());
        assert!(!slot.dispatch());
    }
}
