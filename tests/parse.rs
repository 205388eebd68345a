//! Parsing behavior: the basic scenarios, flag toggles, and boundary
//! errors.

use pretty_assertions::assert_eq;
use quickdom::{Document, Error, NodeKind, ParseFlags, PrintFlags};

fn print_root(doc: &Document<'_>) -> Vec<u8> {
    quickdom::print::print_to_vec(doc.root_element().unwrap(), PrintFlags::NO_INDENTING).unwrap()
}

#[test]
fn single_element() {
    let text = b"<single-element/>";
    let doc = Document::parse(text, ParseFlags::DEFAULT).unwrap();

    let root = doc.root_element().unwrap();
    assert_eq!(root.kind(), NodeKind::Element);
    assert_eq!(root.name(), b"single-element");
    assert!(root.first_attribute().is_none());
    assert!(root.first_child().is_none());
    doc.validate().unwrap();

    assert_eq!(print_root(&doc), text);
}

#[test]
fn prefixed_root_resolves() {
    let doc = Document::parse(
        b"<pfx:single xmlns:pfx='urn:xmpp:example'/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();

    let root = doc.root_element().unwrap();
    assert_eq!(root.prefix(), b"pfx");
    assert_eq!(root.name(), b"single");
    assert_eq!(root.xmlns().unwrap(), b"urn:xmpp:example");
    doc.validate().unwrap();
}

#[test]
fn unbound_attribute_prefix_fails_validation() {
    let doc = Document::parse(
        b"<single-element pfx1:attr='one' attr=\"two\"/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();

    // The tree parses fine and stays inspectable.
    let root = doc.root_element().unwrap();
    assert_eq!(root.first_attribute().unwrap().name(), b"pfx1:attr");

    let err = doc.validate().unwrap_err();
    assert!(matches!(err, Error::AttrXmlnsUnbound { prefix } if prefix == "pfx1"));
}

#[test]
fn numeric_reference_expands_to_utf8() {
    let doc = Document::parse(b"<h>&#128512;</h>", ParseFlags::DEFAULT).unwrap();
    let root = doc.root_element().unwrap();

    assert_eq!(root.raw_value(), b"&#128512;");
    assert_eq!(root.value().unwrap(), &[0xF0, 0x9F, 0x98, 0x80]);
    assert!(root.value_decoded());
}

#[test]
fn entity_values_and_reprint() {
    let text = b"<simple arg=\"&apos;\">&lt;</simple>";
    let doc = Document::parse(text, ParseFlags::FULL).unwrap();

    let root = doc.root_element().unwrap();
    assert_eq!(root.value().unwrap(), b"<");
    assert_eq!(root.first_attribute().unwrap().value().unwrap(), b"'");

    assert_eq!(print_root(&doc), b"<simple arg=\"'\">&lt;</simple>");
}

#[test]
fn parser_is_non_destructive() {
    let text: Vec<u8> =
        b"<a pfx:attr='&amp;'><b>text &#65; more</b><!--c--></a>".to_vec();
    let pristine = text.clone();

    let doc = Document::parse(&text, ParseFlags::COMMENT_NODES).unwrap();
    // Force decoding work.
    let root = doc.root_element().unwrap();
    root.first_child().unwrap().value().unwrap();
    root.first_attribute().unwrap().value().unwrap();
    let _ = print_root(&doc);

    assert_eq!(text, pristine);
}

#[test]
fn fastest_skips_data_nodes() {
    let doc = Document::parse(b"<a>one<b/>two</a>", ParseFlags::FASTEST).unwrap();
    let root = doc.root_element().unwrap();
    let kinds: Vec<NodeKind> = root.children().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Element]);
    // The first data run still lands in the element value.
    assert_eq!(root.value().unwrap(), b"one");
}

#[test]
fn entity_translation_can_be_disabled() {
    let doc = Document::parse(b"<e>&lt;</e>", ParseFlags::NO_ENTITY_TRANSLATION).unwrap();
    assert_eq!(doc.root_element().unwrap().value().unwrap(), b"&lt;");
}

#[test]
fn whitespace_trimming() {
    let doc = Document::parse(b"<e>  padded &amp; trimmed  </e>", ParseFlags::TRIM_WHITESPACE)
        .unwrap();
    assert_eq!(doc.root_element().unwrap().value().unwrap(), b"padded & trimmed");
}

#[test]
fn whitespace_normalization() {
    let doc = Document::parse(b"<e>a  b\t\nc</e>", ParseFlags::NORMALIZE_WHITESPACE).unwrap();
    assert_eq!(doc.root_element().unwrap().value().unwrap(), b"a b c");
}

#[test]
fn attribute_whitespace_untouched() {
    let flags = ParseFlags::TRIM_WHITESPACE | ParseFlags::NORMALIZE_WHITESPACE;
    let doc = Document::parse(b"<e a=' raw  ws '/>", flags).unwrap();
    assert_eq!(
        doc.root_element().unwrap().first_attribute().unwrap().value().unwrap(),
        b" raw  ws "
    );
}

#[test]
fn full_parse_keeps_prolog_nodes() {
    let text = b"<?xml version='1.0'?><!DOCTYPE root><!--hello--><?pi data?><root/>";
    let doc = Document::parse(text, ParseFlags::FULL).unwrap();
    let kinds: Vec<NodeKind> = doc.document_node().children().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Declaration,
            NodeKind::Doctype,
            NodeKind::Comment,
            NodeKind::Pi,
            NodeKind::Element,
        ]
    );
}

#[test]
fn default_parse_drops_prolog_nodes() {
    let text = b"<?xml version='1.0'?><!DOCTYPE root><!--hello--><?pi data?><root/>";
    let doc = Document::parse(text, ParseFlags::DEFAULT).unwrap();
    let kinds: Vec<NodeKind> = doc.document_node().children().map(|c| c.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Element]);
}

#[test]
fn empty_input_is_an_eof_error() {
    assert!(matches!(
        Document::parse(b"", ParseFlags::DEFAULT),
        Err(Error::Eof { .. })
    ));
}

#[test]
fn garbage_before_root() {
    let err = Document::parse(b"garbage<root/>", ParseFlags::DEFAULT).unwrap_err();
    assert!(matches!(err, Error::Parse { message: "expected <", offset: 0 }));
}

#[test]
fn second_root_element_is_rejected() {
    let err = Document::parse(b"<a/>\n<b/>", ParseFlags::DEFAULT).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            message: "more than one root element",
            ..
        }
    ));
}

#[test]
fn out_of_range_character_reference() {
    let doc = Document::parse(b"<e>&#x110000;</e>", ParseFlags::DEFAULT).unwrap();
    let err = doc.root_element().unwrap().value().unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            message: "invalid numeric character entity",
            ..
        }
    ));
}

#[test]
fn no_utf8_emits_single_byte() {
    let doc = Document::parse(b"<e>&#xFFFF;</e>", ParseFlags::NO_UTF8).unwrap();
    assert_eq!(doc.root_element().unwrap().value().unwrap(), &[0xFF]);
}

#[test]
fn unterminated_attribute_value() {
    let err = Document::parse(b"<e a='oops>", ParseFlags::DEFAULT).unwrap_err();
    assert!(matches!(err, Error::Eof { .. }));
}

#[test]
fn missing_equals_in_attribute() {
    let err = Document::parse(b"<e attr/>", ParseFlags::DEFAULT).unwrap_err();
    assert!(matches!(err, Error::Parse { message: "expected =", .. }));
}
