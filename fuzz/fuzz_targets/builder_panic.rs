#![no_main]
use libfuzzer_sys::fuzz_target;
use mrpdiff_analysis::{compare, explain};
use mrpdiff_log::DocumentBuilder;

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are "almost" text in play.
    let s = String::from_utf8_lossy(data);
    let mut mid = s.len() / 2;
    while !s.is_char_boundary(mid) {
        mid -= 1;
    }
    let (left, right) = s.split_at(mid);

    let a = DocumentBuilder::new("a").parse(left);
    let b = DocumentBuilder::new("b").parse(right);
    let _ = explain(&compare(a, b));
});
