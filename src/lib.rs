//! A re-derivation of the attention machinery from "Attention Is All You
//! Need": scaled dot-product attention as a free function, and a multi-head
//! attention module holding its projection weights explicitly. Forward pass
//! only; training, masking and positional encoding are out of scope.

pub mod mha;
