use attention_primer::mha::MultiHeadAttention;
use burn::{prelude::*, tensor::Distribution};

// Run with RUST_LOG=debug to see the per-stage shape diagnostics.
fn main() {
    env_logger::init();

    let mha = MultiHeadAttention::new(512, 8);

    let input = Tensor::random([100, 512], Distribution::Default, mha.device());
    println!("Input:  {:?}", input.dims());

    let output = mha.forward(input);

    println!("Output: {:?}", output.dims());
}
