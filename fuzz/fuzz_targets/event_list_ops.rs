#![no_main]

use clap_event_list::{EventSink, EventSource, FixedSizeEventList, Record};
use libfuzzer_sys::fuzz_target;

const SLOTS: usize = 16;
const MAX_EVENT_SIZE: usize = 40;

// Each input byte selects an operation; the following bytes feed it.
fuzz_target!(|data: &[u8]| {
    let Some((&budget, ops)) = data.split_first() else {
        return;
    };
    let mut list = FixedSizeEventList::<SLOTS, MAX_EVENT_SIZE>::with_capacity_bytes(
        budget as usize * 4,
    );
    let mut scratch = [0u8; MAX_EVENT_SIZE + 8];
    let mut bytes = ops.iter().copied();

    while let Some(op) = bytes.next() {
        let arg = bytes.next().unwrap_or(0) as usize;
        match op % 5 {
            0 => {
                let _ = list.try_allocate(arg % (MAX_EVENT_SIZE + 8));
            }
            1 => {
                let len = arg % scratch.len();
                if let Ok(record) = Record::init(&mut scratch[..len]) {
                    if list.output_events().push(record) {
                        let last = list.get(list.len() - 1).expect("pushed event");
                        assert_eq!(last.len(), len);
                    }
                }
            }
            2 => {
                let _ = list.try_push_bytes(&ops[..arg.min(ops.len())]);
            }
            3 => {
                let source = list.input_events();
                let count = source.count();
                assert_eq!(source.at(arg).is_some(), arg < count);
            }
            _ => list.clear(),
        }
        assert!(list.check_invariants());
        assert!(list.len() <= SLOTS);
        assert!(list.bytes_used() <= list.capacity_bytes());
    }
});
