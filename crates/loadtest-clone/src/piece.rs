//! Fragment chain over a seed script.
//!
//! A script starts as one fragment covering its whole buffer. Assembly splits
//! fragments at match boundaries and rebinds the matched spans, either to a
//! literal (think time) or to a column of a data file. Fragments live in an
//! arena and are linked by [`FragmentId`]; following the links from the head
//! visits every byte of the script exactly once, in order, except where a
//! span has been rebound.

use crate::error::CloneError;
use crate::tracker::DataFileId;
use std::ops::Range;

/// Handle of a fragment in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentId(usize);

/// Handle of a literal buffer owned by a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiteralId(usize);

/// What a fragment writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// Script bytes, copied verbatim.
    Script(Range<usize>),
    /// A literal buffer replacing `span`.
    Literal { span: Range<usize>, literal: LiteralId },
    /// The current value of `column` in a data file, replacing `span`.
    Substitution {
        span: Range<usize>,
        file: DataFileId,
        column: usize,
    },
}

/// One node of the chain.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub kind: FragmentKind,
    next: Option<FragmentId>,
}

impl Fragment {
    /// The following fragment, if any.
    pub fn next(&self) -> Option<FragmentId> {
        self.next
    }
}

/// The seed script and the fragments that describe how to write it.
#[derive(Debug, Clone)]
pub struct FragmentChain {
    script: Vec<u8>,
    literals: Vec<Vec<u8>>,
    fragments: Vec<Fragment>,
}

impl FragmentChain {
    /// Wrap a script buffer as a single fragment.
    pub fn new(script: Vec<u8>) -> Self {
        let whole = Fragment {
            kind: FragmentKind::Script(0..script.len()),
            next: None,
        };
        Self {
            script,
            literals: Vec::new(),
            fragments: vec![whole],
        }
    }

    /// The original script bytes.
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// First fragment of the chain.
    pub fn head(&self) -> FragmentId {
        FragmentId(0)
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the chain is a single empty fragment.
    pub fn is_empty(&self) -> bool {
        self.script.is_empty() && self.fragments.len() == 1
    }

    pub fn get(&self, id: FragmentId) -> &Fragment {
        &self.fragments[id.0]
    }

    pub fn next(&self, id: FragmentId) -> Option<FragmentId> {
        self.fragments[id.0].next
    }

    /// Script range a fragment covers or replaces.
    pub fn span(&self, id: FragmentId) -> Range<usize> {
        match &self.fragments[id.0].kind {
            FragmentKind::Script(span)
            | FragmentKind::Literal { span, .. }
            | FragmentKind::Substitution { span, .. } => span.clone(),
        }
    }

    /// Bytes of a script range.
    pub fn script_bytes(&self, range: &Range<usize>) -> &[u8] {
        &self.script[range.clone()]
    }

    /// Store a literal buffer for later binding.
    pub fn add_literal(&mut self, bytes: Vec<u8>) -> LiteralId {
        self.literals.push(bytes);
        LiteralId(self.literals.len() - 1)
    }

    pub fn literal(&self, id: LiteralId) -> &[u8] {
        &self.literals[id.0]
    }

    /// Iterate over the fragments from the head.
    pub fn iter(&self) -> Fragments<'_> {
        Fragments {
            chain: self,
            next: Some(self.head()),
        }
    }

    /// Cut `range` out of script fragment `id`.
    ///
    /// Up to two remainder fragments are linked in around the cut so the chain
    /// still covers every byte it covered before. Returns the fragment that
    /// now covers exactly `range`.
    pub fn split(&mut self, id: FragmentId, range: Range<usize>) -> Result<FragmentId, CloneError> {
        let FragmentKind::Script(current) = self.fragments[id.0].kind.clone() else {
            return Err(CloneError::Fragment(format!(
                "fragment {} has already been rebound",
                id.0
            )));
        };
        if range.start >= range.end || range.start < current.start || range.end > current.end {
            return Err(CloneError::Fragment(format!(
                "range {range:?} is not inside fragment {current:?}"
            )));
        }

        if range.end < current.end {
            self.insert_after(id, FragmentKind::Script(range.end..current.end));
        }
        if range.start == current.start {
            self.fragments[id.0].kind = FragmentKind::Script(range);
            return Ok(id);
        }
        self.fragments[id.0].kind = FragmentKind::Script(current.start..range.start);
        Ok(self.insert_after(id, FragmentKind::Script(range)))
    }

    /// Replace the script bytes of fragment `id` with a literal.
    pub fn bind_literal(&mut self, id: FragmentId, literal: LiteralId) -> Result<(), CloneError> {
        let span = self.script_span(id)?;
        self.fragments[id.0].kind = FragmentKind::Literal { span, literal };
        Ok(())
    }

    /// Replace the script bytes of fragment `id` with a data file column.
    pub fn bind_substitution(
        &mut self,
        id: FragmentId,
        file: DataFileId,
        column: usize,
    ) -> Result<(), CloneError> {
        let span = self.script_span(id)?;
        self.fragments[id.0].kind = FragmentKind::Substitution { span, file, column };
        Ok(())
    }

    fn script_span(&self, id: FragmentId) -> Result<Range<usize>, CloneError> {
        match &self.fragments[id.0].kind {
            FragmentKind::Script(range) => Ok(range.clone()),
            _ => Err(CloneError::Fragment(format!(
                "fragment {} has already been rebound",
                id.0
            ))),
        }
    }

    fn insert_after(&mut self, id: FragmentId, kind: FragmentKind) -> FragmentId {
        let new_id = FragmentId(self.fragments.len());
        let next = self.fragments[id.0].next.replace(new_id);
        self.fragments.push(Fragment { kind, next });
        new_id
    }
}

/// Iterator over a chain in write order.
pub struct Fragments<'a> {
    chain: &'a FragmentChain,
    next: Option<FragmentId>,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = (FragmentId, &'a Fragment);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let fragment = self.chain.get(id);
        self.next = fragment.next;
        Some((id, fragment))
    }
}
