//! # Reconstrução de Spans Descontínuos
//!
//! Uma anotação `T` pode ter vários intervalos separados por `;`
//! (ex: `T1	Disease 0 6;15 19	severe pain`). O brat grava na terceira coluna
//! apenas o texto exibido, com os fragmentos unidos por um espaço. Este módulo
//! recupera o texto de cada fragmento a partir desse texto bruto.
//!
//! ## Algoritmo
//! 1. Um único intervalo: o texto bruto inteiro é o fragmento.
//! 2. Vários intervalos: um cursor percorre o texto bruto; para cada intervalo
//!    consome `end - start` caracteres e depois pula qualquer sequência de espaços.
//!
//! É uma heurística: fragmentos cujo espaçamento interno difere do documento
//! original podem ser cortados no lugar errado.
//!
//! Todos os offsets são em **caracteres**, nunca em bytes.

use crate::annotation::Offset;

/// Divide o texto bruto de uma anotação em um fragmento por intervalo.
///
/// # Exemplo
/// ```rust
/// use brat_core::annotation::Offset;
/// use brat_core::span::split_fragments;
///
/// let parts = split_fragments("severe pain", &[Offset::new(0, 6), Offset::new(15, 19)]);
/// assert_eq!(parts, vec!["severe", "pain"]);
/// ```
pub fn split_fragments(raw: &str, offsets: &[Offset]) -> Vec<String> {
    if offsets.len() <= 1 {
        return vec![raw.to_string()];
    }

    let chars: Vec<char> = raw.chars().collect();
    let n = chars.len();
    let mut cursor = 0;
    let mut fragments = Vec::with_capacity(offsets.len());

    for offset in offsets {
        let chunk_len = offset.len();
        let from = cursor.min(n);
        let to = cursor.saturating_add(chunk_len).min(n);
        fragments.push(chars[from..to].iter().collect());
        cursor = cursor.saturating_add(chunk_len);

        while cursor < n && chars[cursor] == ' ' {
            cursor += 1;
        }
    }

    fragments
}

/// Índice de fronteiras de caracteres de um texto, para fatiar por offsets
/// de caractere em O(1) depois de uma passada O(n).
pub struct CharIndex<'a> {
    text: &'a str,
    /// `boundaries[i]` = posição em bytes do i-ésimo caractere; o último elemento é `text.len()`.
    boundaries: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    /// Total de caracteres do texto.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Fatia `[start, end)` em caracteres; `None` se fora dos limites ou invertido.
    pub fn slice(&self, offset: Offset) -> Option<&'a str> {
        if offset.start > offset.end || offset.end > self.char_len() {
            return None;
        }
        let from = self.boundaries[offset.start];
        let to = self.boundaries[offset.end];
        Some(&self.text[from..to])
    }
}

/// Atalho para fatiar uma única vez.
pub fn slice_chars(text: &str, offset: Offset) -> Option<&str> {
    CharIndex::new(text).slice(offset)
}
