#![no_main]

use libfuzzer_sys::fuzz_target;
use texprobe::Dispatcher;

fuzz_target!(|data: &[u8]| {
    let dispatcher = Dispatcher::new();
    let first = dispatcher.probe(data);

    // Appending bytes past a valid header must not change the verdict.
    if let Ok(loader) = &first {
        let mut extended = data.to_vec();
        extended.extend_from_slice(&[0xFF; 16]);
        assert_eq!(dispatcher.probe(&extended).as_ref(), Ok(loader));
    }
});
