use chip::{chip8::Machine, resources::Rom};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::mock::StepRng;

const ROM_NAME: &str = "LOOP";

/// A small program that keeps drawing random glyphs forever.
///
/// ```text
/// 0x200  6000  V0 = 0x00
/// 0x202  C10F  V1 = rand & 0x0F
/// 0x204  F129  I = sprite(V1)
/// 0x206  D005  draw I at (V0, V0)
/// 0x208  7001  V0 += 1
/// 0x20A  8014  V0 += V1
/// 0x20C  1202  jump 0x202
/// ```
static BASE_ROM: once_cell::sync::Lazy<Rom> = once_cell::sync::Lazy::new(|| {
    let program: [u16; 7] = [0x6000, 0xC10F, 0xF129, 0xD005, 0x7001, 0x8014, 0x1202];
    let data: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
    Rom::new(ROM_NAME, data)
});

fn get_base() -> Rom {
    BASE_ROM.clone()
}

/// will setup the default configured machine
fn get_default_machine() -> Machine {
    let mut machine = Machine::new().with_rng(Box::new(StepRng::new(0x42, 0x11)));
    machine
        .load_rom(&get_base())
        .expect("The benchmark rom fits into memory.");
    machine
}

pub fn step_bench(c: &mut Criterion) {
    let mut machine = get_default_machine();
    c.bench_function("step_bench", |b| {
        b.iter(|| {
            let _ = machine.step();
        });
    });
}

pub fn print_bench(c: &mut Criterion) {
    let mut machine = get_default_machine();
    for _ in 0..100 {
        let _ = machine.step();
    }
    c.bench_function("print_bench", |b| {
        b.iter(|| {
            let _ = format!("{}", machine);
        });
    });
}

criterion_group!(benches, step_bench, print_bench);
criterion_main!(benches);
