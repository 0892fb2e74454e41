// Binding, filling, and round-tripping a ciphertext through the byte codec.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rlwe::{Ciphertext, ParameterContext};
use rlwe_traits::{DeserializeParametrized, Serialize};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let moduli = [0x3fffffff000001u64, 0x3ffffffef40001, 0x3ffffffeb80001];
    let context = ParameterContext::new_arc(&moduli, 4096);
    context.validate()?;
    println!("chain levels: {}", context.max_level() + 1);

    let mut ct = Ciphertext::new();
    ct.resize(&context, context.first_parms_id(), 2)?;
    println!(
        "bound ciphertext: size={} mod_count={} degree={} ({} coefficients)",
        ct.size(),
        ct.mod_count(),
        ct.degree(),
        ct.data().len(),
    );

    let mut rng = ChaCha8Rng::from_entropy();
    let (degree, mod_count) = (ct.degree(), ct.mod_count());
    for i in 0..ct.size() {
        let component = ct.get_mut(i).expect("component within size");
        for j in 0..mod_count {
            for coeff in &mut component[j * degree..(j + 1) * degree] {
                *coeff = rng.gen_range(0..moduli[j]);
            }
        }
    }
    assert!(ct.is_valid_for(&context));

    let bytes = ct.to_bytes();
    println!("serialized: {} bytes", bytes.len());

    let restored = Ciphertext::from_bytes(&bytes, &context)?;
    assert_eq!(restored, ct);
    println!("round trip succeeded");
    Ok(())
}
