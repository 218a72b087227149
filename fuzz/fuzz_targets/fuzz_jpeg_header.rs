#![no_main]

use libfuzzer_sys::fuzz_target;
use texprobe::{ByteReader, LoaderFactory};

fuzz_target!(|data: &[u8]| {
    if let Ok(loader) = LoaderFactory::Jpeg.try_create(&ByteReader::new(data)) {
        assert!(loader.width() > 0 && loader.height() > 0);
        let _ = loader.decoded_size();
    }
});
