#![no_main]

use libfuzzer_sys::fuzz_target;
use texprobe::{ByteReader, LoaderFactory, ProbeConfig};

fuzz_target!(|data: &[u8]| {
    let reader = ByteReader::new(data);
    let _ = LoaderFactory::Png.try_create(&reader);

    let lenient = ProbeConfig::new()
        .with_png_field_checks(false)
        .with_crc_verification(true);
    if let Ok(loader) = LoaderFactory::Png.try_create_with(&reader, &lenient) {
        assert!(loader.width() <= 0x7FFF_FFFF && loader.height() <= 0x7FFF_FFFF);
    }
});
