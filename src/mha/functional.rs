use burn::prelude::*;
use burn::tensor::activation::softmax;

/// Axis the attention weights are normalized over.
///
/// The scores tensor has shape `[n_heads, seq_len (queries), seq_len (keys)]`.
/// The standard formulation normalizes each query's distribution over the key
/// positions; `Heads` instead normalizes across the head axis, kept selectable
/// for studying how the two normalizations differ.
#[derive(Config, Debug, PartialEq)]
pub enum SoftmaxAxis {
    /// Normalize over key positions (the last axis). Standard behavior.
    Keys,
    /// Normalize over the head axis (axis 0).
    Heads,
}

impl SoftmaxAxis {
    fn dim(&self) -> usize {
        match self {
            SoftmaxAxis::Keys => 2,
            SoftmaxAxis::Heads => 0,
        }
    }
}

/// Softmax shifted by the per-slice maximum, so extreme scores cannot
/// overflow the exponential.
pub fn stable_softmax<B: Backend, const D: usize>(tensor: Tensor<B, D>, dim: usize) -> Tensor<B, D> {
    let max_val = tensor.clone().max_dim(dim);
    softmax(tensor - max_val, dim)
}

/// Core scaled dot-product attention logic, one batch entry per head.
///
/// `q`, `k` and `v` are `[n_heads, seq_len, d_head]`. Returns the context
/// (same shape as `v`) together with the attention weights
/// (`[n_heads, seq_len, seq_len]`).
pub fn scaled_dot_product_attention<B: Backend>(
    q: Tensor<B, 3>,
    k: Tensor<B, 3>,
    v: Tensor<B, 3>,
    axis: SoftmaxAxis,
) -> (Tensor<B, 3>, Tensor<B, 3>) {
    let [_, _, d_head] = q.dims();

    // Q * K^T -> [n_heads, seq, seq], scaled by 1/sqrt(d_head) so the score
    // magnitude stays flat as d_head grows and the softmax does not saturate.
    let k_t = k.swap_dims(1, 2);
    let scores = q.matmul(k_t) / (d_head as f64).sqrt();

    let weights = stable_softmax(scores, axis.dim());

    // Weights * V -> [n_heads, seq, d_head]
    let context = weights.clone().matmul(v);

    (context, weights)
}
