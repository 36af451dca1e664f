use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention,
            MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::vocab::PAD_ID;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub source_vocab_size: usize,
    pub target_vocab_size: usize,
    pub max_source_len:    usize,
    pub max_target_len:    usize,
    pub d_model:           usize,
    pub num_heads:         usize,
    pub num_layers:        usize,
    pub d_ff:              usize,
    pub dropout:           f64,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        let source_embedding = EmbeddingConfig::new(self.source_vocab_size, self.d_model)
            .init(device);
        let source_pos_embedding = EmbeddingConfig::new(self.max_source_len, self.d_model)
            .init(device);
        let target_embedding = EmbeddingConfig::new(self.target_vocab_size, self.d_model)
            .init(device);
        let target_pos_embedding = EmbeddingConfig::new(self.max_target_len, self.d_model)
            .init(device);
        let encoder_layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let decoder_layers: Vec<DecoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let projection = LinearConfig::new(self.d_model, self.target_vocab_size).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        Seq2SeqModel {
            source_embedding, source_pos_embedding,
            target_embedding, target_pos_embedding,
            encoder_layers, decoder_layers,
            final_norm, projection, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let self_attn = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let cross_attn = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let norm3   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        DecoderBlock {
            self_attn, cross_attn, ffn_linear1, ffn_linear2,
            norm1, norm2, norm3, dropout,
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    /// `causal_mask` keeps position t from attending past itself —
    /// without it teacher forcing would leak future target tokens.
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        memory: Tensor<B, 3>,
        causal_mask: Tensor<B, 3, Bool>,
    ) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(causal_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));

        let cross = self
            .cross_attn
            .forward(MhaInput::new(x.clone(), memory.clone(), memory))
            .context;
        let x = self.norm2.forward(x + self.dropout.forward(cross));

        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm3.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Attention encoder-decoder over opaque token ids. Both decoder
/// topologies run this same network — they differ only in bucket
/// shapes and in how the target side was serialized upstream.
#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub source_embedding:     Embedding<B>,
    pub source_pos_embedding: Embedding<B>,
    pub target_embedding:     Embedding<B>,
    pub target_pos_embedding: Embedding<B>,
    pub encoder_layers:       Vec<EncoderBlock<B>>,
    pub decoder_layers:       Vec<DecoderBlock<B>>,
    pub final_norm:           LayerNorm<B>,
    pub projection:           Linear<B>,
    pub dropout:              Dropout,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// source_ids: [batch, src_len] → memory: [batch, src_len, d_model]
    pub fn encode(&self, source_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, src_len] = source_ids.dims();

        let tok_emb = self.source_embedding.forward(source_ids);
        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..src_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, src_len]);
        let pos_emb = self.source_pos_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.encoder_layers {
            x = layer.forward(x);
        }
        x
    }

    /// target_input_ids: [batch, tgt_len], memory: [batch, src_len, d_model]
    /// → logits: [batch, tgt_len, target_vocab]
    pub fn decode(
        &self,
        target_input_ids: Tensor<B, 2, Int>,
        memory: Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = target_input_ids.dims();
        let device = memory.device();

        let tok_emb = self.target_embedding.forward(target_input_ids);
        let positions = Tensor::<B, 1, Int>::arange(0..tgt_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, tgt_len]);
        let pos_emb = self.target_pos_embedding.forward(positions);

        let causal_mask = generate_autoregressive_mask::<B>(batch_size, tgt_len, &device);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.decoder_layers {
            x = layer.forward(x, memory.clone(), causal_mask.clone());
        }
        let x = self.final_norm.forward(x);
        self.projection.forward(x)
    }

    pub fn forward(
        &self,
        source_ids: Tensor<B, 2, Int>,
        target_input_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let memory = self.encode(source_ids);
        self.decode(target_input_ids, memory)
    }

    /// Teacher-forced loss: cross entropy over every target
    /// position, padding masked out.
    pub fn forward_loss(
        &self,
        source_ids:        Tensor<B, 2, Int>,
        target_input_ids:  Tensor<B, 2, Int>,
        target_output_ids: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(source_ids, target_input_ids);
        let [batch_size, tgt_len, vocab] = logits.dims();

        let ce = CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![PAD_ID as usize]))
            .init(&logits.device());
        let loss = ce.forward(
            logits.clone().reshape([batch_size * tgt_len, vocab]),
            target_output_ids.reshape([batch_size * tgt_len]),
        );
        (loss, logits)
    }
}
