mod tests {
    use hexstrip::sim::{PortAccess, PortEvent, SimBus, Writer};
    use hexstrip::{EngineConfig, Error, InterruptSlot, TransferPhase, TransferState, init};

    fn data_writes(events: &[PortEvent]) -> Vec<(Option<u32>, u64, u16)> {
        events
            .iter()
            .filter_map(|event| match (event.writer, event.access) {
                (Writer::Dma(_), PortAccess::Write(word)) => {
                    Some((event.tick, event.at_nanos, word))
                }
                _ => None,
            })
            .collect()
    }

    fn clock_pulses(events: &[PortEvent]) -> Vec<(Option<u32>, u64, u16)> {
        events
            .iter()
            .filter_map(|event| match (event.writer, event.access) {
                (Writer::Dma(_), PortAccess::Set(mask)) => Some((event.tick, event.at_nanos, mask)),
                _ => None,
            })
            .collect()
    }

    type TimedAccess = (Option<u32>, Writer, PortAccess, u16, u64);

    fn written_words(events: &[PortEvent]) -> Vec<u16> {
        events
            .iter()
            .filter_map(|event| match event.access {
                PortAccess::Write(word) => Some(word),
                PortAccess::Set(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_sixteen_byte_frame_end_to_end() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(16, 0x0001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);

        // init drives the idle level: clock low, data high
        assert_eq!(bus.level(), 0xFFFE);
        bus.clear_trace();

        let mut frame = [0xFFFF_u16; 8];
        gate.show(&mut frame).unwrap();

        assert_eq!(frame, [0xFFFE; 8]);
        assert!(!gate.busy());
        assert_eq!(gate.phase(), TransferPhase::Idle);

        bus.with_trace(|events| {
            let data = data_writes(events);
            let clock = clock_pulses(events);
            assert_eq!(data.len(), 8);
            assert_eq!(clock.len(), 8);
            assert!(data.iter().all(|&(_, _, word)| word == 0xFFFE));
            assert!(clock.iter().all(|&(_, _, mask)| mask == 0x0001));

            // every tick ends with all sixteen lines high: 15 data lines plus the clock
            let highs = events
                .iter()
                .filter(|event| matches!(event.access, PortAccess::Set(_)))
                .all(|event| event.level == 0xFFFF);
            assert!(highs);

            let last = events.last().unwrap();
            assert_eq!(last.writer, Writer::Cpu);
            assert_eq!(last.access, PortAccess::Write(0xFFFE));
        });
        assert_eq!(bus.level(), 0xFFFE);
    }

    #[test]
    fn test_pulse_count_matches_word_count() {
        for buf_size in [2, 4, 10, 64, 300, 2000] {
            let bus = SimBus::new();
            let state = TransferState::new();
            let slot = InterruptSlot::new();
            let config = EngineConfig::new(buf_size, 0x8000, false, 800_000);
            let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
            slot.install(handler);
            bus.clear_trace();

            let mut frame: Vec<u16> = (0..buf_size / 2).map(|i| i as u16).collect();
            gate.show(&mut frame).unwrap();

            bus.with_trace(|events| {
                assert_eq!(data_writes(events).len(), buf_size / 2);
                assert_eq!(clock_pulses(events).len(), buf_size / 2);
            });
            assert_eq!(bus.dropped_events(), 0);
        }
    }

    #[test]
    fn test_data_settles_before_clock_rises() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(40, 0x0100, false, 2_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);
        bus.clear_trace();

        let mut frame: Vec<u16> = (0..20).map(|i| 0x5A5A ^ (i * 0x0101)).collect();
        let settle = gate.timing().settle_nanos();
        gate.show(&mut frame).unwrap();

        bus.with_trace(|events| {
            let data = data_writes(events);
            let clock = clock_pulses(events);
            assert_eq!(data.len(), clock.len());
            for (k, (write, pulse)) in data.iter().zip(clock.iter()).enumerate() {
                assert_eq!(write.0, Some(k as u32));
                assert_eq!(pulse.0, Some(k as u32));
                assert!(write.1 < pulse.1, "tick {k}: data at {} clock at {}", write.1, pulse.1);
                assert!((pulse.1 - write.1).abs_diff(settle) <= 1);
            }
            // next tick's data write pulls the clock line low again
            for pair in data.windows(2) {
                assert!(pair[1].2 & 0x0100 == 0);
            }
        });
    }

    #[test]
    fn test_repeated_frames_produce_identical_writes() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(24, 0x0001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);

        let pattern: [u16; 12] = [
            0x1234, 0xFFFF, 0x0000, 0xAAAA, 0x5555, 0x0F0F, 0xF0F0, 0x8001, 0x7FFE, 0x00FF, 0xFF00,
            0x3C3C,
        ];
        let mut runs = Vec::new();
        for _ in 0..3 {
            bus.clear_trace();
            let mut frame = pattern;
            gate.show(&mut frame).unwrap();
            let relative: Vec<TimedAccess> = bus.with_trace(|events| {
                let start = events[0].at_nanos;
                events
                    .iter()
                    .map(|e| (e.tick, e.writer, e.access, e.level, e.at_nanos - start))
                    .filter(|e| e.1 != Writer::Cpu)
                    .collect()
            });
            runs.push(relative);
        }
        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[1], runs[2]);
    }

    #[test]
    fn test_skip_clear_leaves_frame_untouched() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(8, 0x0001, true, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);
        bus.clear_trace();

        let mut frame = [0xFFFF, 0x0001, 0x1235, 0x0000];
        gate.show(&mut frame).unwrap();

        assert_eq!(frame, [0xFFFF, 0x0001, 0x1235, 0x0000]);
        bus.with_trace(|events| {
            let words: Vec<u16> = data_writes(events).iter().map(|w| w.2).collect();
            assert_eq!(words, vec![0xFFFF, 0x0001, 0x1235, 0x0000]);
        });
    }

    #[test]
    fn test_scrub_clears_every_clock_bit() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(8, 0x8001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);

        let mut frame = [0xFFFF, 0x8001, 0x1234, 0x0000];
        gate.show(&mut frame).unwrap();
        assert_eq!(frame, [0x7FFE, 0x0000, 0x1234, 0x0000]);
    }

    #[test]
    fn test_wrong_frame_length_is_rejected() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(16, 0x0001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);
        bus.clear_trace();

        let mut short = [0xFFFF_u16; 7];
        assert_eq!(
            gate.show(&mut short),
            Err(Error::FrameLength {
                expected: 8,
                actual: 7
            })
        );
        assert_eq!(short, [0xFFFF; 7]);
        assert!(!state.is_active());
        bus.with_trace(|events| assert!(events.is_empty()));
    }

    #[test]
    fn test_stale_edges_are_dropped_before_release() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(4, 0x0001, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);

        // the free-running generator has latched edges nobody consumed
        assert_eq!(bus.pending_edges(), (true, true));
        bus.clear_trace();

        let mut frame = [0x0002, 0x0004];
        gate.show(&mut frame).unwrap();

        bus.with_trace(|events| {
            assert!(events.iter().all(|e| e.writer == Writer::Cpu || e.tick.is_some()));
            assert_eq!(data_writes(events).len(), 2);
        });
    }

    #[test]
    fn test_back_to_back_frames_never_interleave() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(8, 0x0001, false, 1_000_000);
        let latch_nanos = config.latch_delay.as_micros() * 1000;
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);
        bus.clear_trace();

        let mut first = [0x0002_u16; 4];
        let mut second = [0x0004_u16; 4];
        // SAFETY: the simulated pipeline finishes each frame before `start` returns.
        unsafe {
            gate.start(&mut first).unwrap();
            gate.start(&mut second).unwrap();
        }
        gate.wait_idle();

        bus.with_trace(|events| {
            let writers: Vec<(Writer, PortAccess)> =
                events.iter().map(|e| (e.writer, e.access)).collect();
            let idle_at: Vec<usize> = writers
                .iter()
                .enumerate()
                .filter(|(_, w)| w.0 == Writer::Cpu)
                .map(|(i, _)| i)
                .collect();
            // one idle write closes each frame
            assert_eq!(idle_at, vec![8, 17]);
            assert!(written_words(&events[..8]).iter().all(|&word| word == 0x0002));
            assert!(written_words(&events[9..17]).iter().all(|&word| word == 0x0004));

            // the second frame waits out the first frame's latch interval
            let first_done = events[8].at_nanos;
            let second_begin = events[9].at_nanos;
            // completion stamps have microsecond resolution
            assert!(second_begin - first_done + 1_000 >= latch_nanos);
        });
    }

    #[test]
    fn test_clock_mask_on_high_byte() {
        let bus = SimBus::new();
        let state = TransferState::new();
        let slot = InterruptSlot::new();
        let config = EngineConfig::new(6, 0x0800, false, 1_000_000);
        let (mut gate, handler) = init(&config, &state, bus.hardware(&slot)).unwrap();
        slot.install(handler);
        assert_eq!(bus.level(), 0xF7FF);
        bus.clear_trace();

        let mut frame = [0x0800, 0x0801, 0xFFFF];
        gate.show(&mut frame).unwrap();

        bus.with_trace(|events| {
            let levels: Vec<u16> = events
                .iter()
                .filter(|e| matches!(e.access, PortAccess::Set(_)))
                .map(|e| e.level)
                .collect();
            assert_eq!(levels, vec![0x0800, 0x0801, 0xFFFF]);
        });
        assert_eq!(bus.level(), 0xF7FF);
    }
}
