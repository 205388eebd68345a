//! Parse/print/query throughput over a synthetic feed document.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use quickdom::{print, Document, ParseFlags, Path, PrintFlags};

/// A feed-shaped document: many small elements, some attributes, a few
/// entities so the decoder has occasional work.
fn build_input(items: usize) -> Vec<u8> {
    let mut text = Vec::with_capacity(items * 96);
    text.extend_from_slice(b"<feed xmlns='urn:bench:feed' xmlns:m='urn:bench:meta'>");
    for i in 0..items {
        text.extend_from_slice(
            format!(
                "<entry id='{i}' kind=\"post\"><title>entry {i} &amp; friends</title>\
<m:stamp when='2024-07-0{}'/><body>body text for entry {i}</body></entry>",
                (i % 9) + 1
            )
            .as_bytes(),
        );
    }
    text.extend_from_slice(b"</feed>");
    text
}

fn bench_parse(c: &mut Criterion) {
    let input = build_input(200);
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("default", |b| {
        b.iter(|| Document::parse(black_box(&input), ParseFlags::DEFAULT).unwrap())
    });
    group.bench_function("fastest", |b| {
        b.iter(|| Document::parse(black_box(&input), ParseFlags::FASTEST).unwrap())
    });
    group.bench_function("full", |b| {
        b.iter(|| Document::parse(black_box(&input), ParseFlags::FULL).unwrap())
    });
    group.finish();
}

fn bench_print(c: &mut Criterion) {
    let input = build_input(200);
    let clean = Document::parse(&input, ParseFlags::DEFAULT).unwrap();

    let mut dirty = Document::parse(&input, ParseFlags::DEFAULT).unwrap();
    let root = dirty.root_element().unwrap().id();
    dirty.set_name(root, "feed");

    let mut group = c.benchmark_group("print");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("clean_fast_path", |b| {
        b.iter(|| {
            print::print_to_vec(clean.root_element().unwrap(), PrintFlags::NO_INDENTING)
                .unwrap()
        })
    });
    group.bench_function("dirty_reserialize", |b| {
        b.iter(|| {
            print::print_to_vec(dirty.root_element().unwrap(), PrintFlags::NO_INDENTING)
                .unwrap()
        })
    });
    group.finish();
}

fn bench_xpath(c: &mut Criterion) {
    let input = build_input(200);
    let doc = Document::parse(&input, ParseFlags::DEFAULT).unwrap();
    let path = Path::parse("//entry[@id='150']").unwrap();

    c.bench_function("xpath_attr_lookup", |b| {
        b.iter(|| {
            path.first(black_box(doc.document_node()))
                .unwrap()
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_parse, bench_print, bench_xpath);
criterion_main!(benches);
