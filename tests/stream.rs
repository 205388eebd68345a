//! XML-stream parsing: an open-only root followed by one fragment at a
//! time, with prefix bindings flowing from the stream header into the
//! fragments.

use pretty_assertions::assert_eq;
use quickdom::{Document, Error, ParseFlags, PrintFlags};

#[test]
fn open_only_root() {
    let text = b"<pfx:single xmlns:pfx='urn:xmpp:example'>";
    let (doc, consumed) =
        Document::parse_partial(text, ParseFlags::OPEN_ONLY, None).unwrap();

    let root = doc.root_element().unwrap();
    assert_eq!(root.prefix(), b"pfx");
    assert_eq!(root.name(), b"single");
    assert_eq!(root.xmlns().unwrap(), b"urn:xmpp:example");
    assert!(root.first_child().is_none());
    assert!(!root.clean());
    assert_eq!(consumed, text.len());
    doc.validate().unwrap();
}

#[test]
fn stream_header_then_fragments() {
    let text: &[u8] = b"<pfx:single xmlns='jabber:client' xmlns:pfx='urn:xmpp:example'>\
<pfx:features><feature1/><feature2/></pfx:features>\
<message to='me@mydomain.com' from='you@yourdomain.com' xml:lang='en'><body>Hello!</body></message>";

    let (stream, mut offset) =
        Document::parse_partial(text, ParseFlags::OPEN_ONLY, None).unwrap();
    assert_eq!(stream.root_element().unwrap().name(), b"single");
    stream.validate().unwrap();

    let mut roots: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    while offset < text.len() {
        let (fragment, consumed) =
            Document::parse_partial(&text[offset..], ParseFlags::PARSE_ONE, Some(&stream))
                .unwrap();
        fragment.validate().unwrap();
        let root = fragment.root_element().unwrap();
        roots.push((root.name().to_vec(), root.xmlns().unwrap().to_vec()));
        offset += consumed;
    }

    assert_eq!(
        roots,
        vec![
            (b"features".to_vec(), b"urn:xmpp:example".to_vec()),
            (b"message".to_vec(), b"jabber:client".to_vec()),
        ]
    );
}

#[test]
fn fragment_children_inherit_stream_bindings() {
    let header = b"<stream:stream xmlns:stream='http://etherx.jabber.org/streams' xmlns='jabber:client'>";
    let (stream, _) = Document::parse_partial(header, ParseFlags::OPEN_ONLY, None).unwrap();

    let stanza = b"<stream:features><mechanisms/></stream:features>";
    let (fragment, consumed) =
        Document::parse_partial(stanza, ParseFlags::PARSE_ONE, Some(&stream)).unwrap();
    assert_eq!(consumed, stanza.len());

    let features = fragment.root_element().unwrap();
    assert_eq!(
        features.xmlns().unwrap(),
        b"http://etherx.jabber.org/streams"
    );
    let mechanisms = features.first_child().unwrap();
    assert_eq!(mechanisms.xmlns().unwrap(), b"jabber:client");
}

#[test]
fn fragment_rebinding_shadows_the_stream() {
    let header = b"<s xmlns='urn:outer'>";
    let (stream, _) = Document::parse_partial(header, ParseFlags::OPEN_ONLY, None).unwrap();

    let (fragment, _) = Document::parse_partial(
        b"<inner xmlns='urn:inner'/>",
        ParseFlags::PARSE_ONE,
        Some(&stream),
    )
    .unwrap();
    assert_eq!(
        fragment.root_element().unwrap().xmlns().unwrap(),
        b"urn:inner"
    );
}

#[test]
fn unbound_fragment_prefix_without_stream_context() {
    let (fragment, _) =
        Document::parse_partial(b"<pfx:e/>", ParseFlags::PARSE_ONE, None).unwrap();
    let err = fragment.validate().unwrap_err();
    assert!(matches!(err, Error::ElementXmlnsUnbound { .. }));
}

#[test]
fn truncated_open_tag_is_eof() {
    let err =
        Document::parse_partial(b"<stream xmlns='urn:x'", ParseFlags::OPEN_ONLY, None)
            .unwrap_err();
    assert!(matches!(err, Error::Eof { .. }));
}

#[test]
fn parse_one_leaves_the_rest_untouched() {
    let text = b"<a>first</a><b>second</b><c/>";
    let (one, consumed) =
        Document::parse_partial(text, ParseFlags::PARSE_ONE, None).unwrap();
    assert_eq!(one.root_element().unwrap().value().unwrap(), b"first");
    assert_eq!(&text[consumed..], b"<b>second</b><c/>");

    let (two, consumed2) =
        Document::parse_partial(&text[consumed..], ParseFlags::PARSE_ONE, None).unwrap();
    assert_eq!(two.root_element().unwrap().value().unwrap(), b"second");
    assert_eq!(&text[consumed + consumed2..], b"<c/>");
}

#[test]
fn fragments_round_trip() {
    let header = b"<s xmlns:p='urn:p'>";
    let (stream, _) = Document::parse_partial(header, ParseFlags::OPEN_ONLY, None).unwrap();

    let stanza = b"<p:msg p:kind='chat'>hi &amp; bye</p:msg>";
    let (fragment, _) =
        Document::parse_partial(stanza, ParseFlags::PARSE_ONE, Some(&stream)).unwrap();
    fragment.validate().unwrap();

    let out = quickdom::print::print_to_vec(
        fragment.root_element().unwrap(),
        PrintFlags::NO_INDENTING,
    )
    .unwrap();
    assert_eq!(out.as_slice(), stanza.as_slice());
}
