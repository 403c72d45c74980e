#![no_main]

use libfuzzer_sys::fuzz_target;
use notebook_engine::{
    classify, extract_cells, reconcile, CellFate, ChangeSummary, ChangedRange, ParsedDocument,
    SyntaxNode, CELL_NODE_KIND,
};
use notebook_model::{CellIdAllocator, Generation};

/// Keep the harness itself bounded: documents and edit scripts derived from
/// oversized inputs just get truncated.
const MAX_INPUT_BYTES: usize = 4096;

/// Map arbitrary bytes onto the small alphabet the line grammar cares about.
fn build_text(data: &[u8]) -> String {
    data.iter()
        .map(|byte| match byte % 8 {
            0 => '\n',
            1 => '=',
            2 => '#',
            n => char::from(b'a' + n),
        })
        .collect()
}

/// Line-based fixture grammar mirroring the host parser's shape: `#` lines
/// are prose, `=`-carrying lines are code cells, everything else is prose.
fn parse(text: &str) -> ParsedDocument {
    let mut children = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        if !body.is_empty() {
            let kind = if body.starts_with('#') {
                "Prose"
            } else if body.contains('=') {
                CELL_NODE_KIND
            } else {
                "Prose"
            };
            children.push(SyntaxNode::new(kind, offset, offset + body.len()));
        }
        offset += line.len();
    }
    let root = SyntaxNode::new("Document", 0, text.len()).with_children(children);
    ParsedDocument::new(text, root)
}

/// Decode an ascending, disjoint edit script from raw bytes.
fn decode_edits(data: &[u8], len: usize) -> (Vec<(usize, usize, String)>, ChangeSummary) {
    let mut edits = Vec::new();
    let mut ranges = Vec::new();
    let mut cursor = 0usize;
    let mut delta = 0isize;
    for chunk in data.chunks(3).take(4) {
        if chunk.len() < 3 || cursor > len {
            break;
        }
        let from = cursor + (chunk[0] as usize) % (len - cursor + 1);
        let to = from + (chunk[1] as usize) % (len - from + 1);
        let insert = build_text(&chunk[2..3]).repeat((chunk[2] % 3) as usize);
        let new_from = (from as isize + delta) as usize;
        let new_to = new_from + insert.len();
        ranges.push(ChangedRange::new(from, to, new_from, new_to));
        delta += insert.len() as isize - (to - from) as isize;
        edits.push((from, to, insert));
        cursor = to;
    }
    let changes = ChangeSummary::new(ranges).expect("decoded edits are sorted and disjoint");
    (edits, changes)
}

fn apply(text: &str, edits: &[(usize, usize, String)]) -> String {
    let mut out = String::new();
    let mut last = 0;
    for (from, to, insert) in edits {
        out.push_str(&text[last..*from]);
        out.push_str(insert);
        last = *to;
    }
    out.push_str(&text[last..]);
    out
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let data = if data.len() > MAX_INPUT_BYTES {
        &data[..MAX_INPUT_BYTES]
    } else {
        data
    };

    let split = data.len() / 2;
    let text = build_text(&data[..split]);

    let mut ids = CellIdAllocator::new();
    let spans = extract_cells(&parse(&text));
    let prev = reconcile(&Generation::empty(), &ChangeSummary::none(), spans, &mut ids)
        .expect("extraction yields disjoint ascending spans");

    let (edits, changes) = decode_edits(&data[split..], text.len());
    let new_text = apply(&text, &edits);

    let spans = extract_cells(&parse(&new_text));
    let next = reconcile(&prev, &changes, spans, &mut ids)
        .expect("a validated change summary never produces an invalid generation");

    // Deleted identities must not survive.
    for cell in prev.cells() {
        if classify(cell.span, &changes) == CellFate::Deleted {
            assert!(next.get(cell.id).is_none());
        }
    }

    // Remap-only passes are idempotent.
    let spans = extract_cells(&parse(&new_text));
    let again = reconcile(&next, &ChangeSummary::none(), spans, &mut ids)
        .expect("no-op reconciliation cannot fail");
    assert_eq!(again, next);
});
