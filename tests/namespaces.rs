//! Namespace resolution, reserved prefixes, find-by-name defaulting,
//! and validation failures.

use pretty_assertions::assert_eq;
use quickdom::{ns, Document, Error, ParseFlags};

#[test]
fn unbound_element_prefix() {
    let doc = Document::parse(b"<pfx:single-element/>", ParseFlags::DEFAULT).unwrap();
    assert_eq!(doc.root_element().unwrap().name(), b"single-element");

    let err = doc.validate().unwrap_err();
    assert!(matches!(err, Error::ElementXmlnsUnbound { prefix } if prefix == "pfx"));
}

#[test]
fn doubled_attribute() {
    let doc = Document::parse(
        b"<single-element attr='one' attr=\"two\"/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let err = doc.validate().unwrap_err();
    assert!(matches!(err, Error::DuplicateAttribute { name } if name == "attr"));
}

#[test]
fn doubled_attribute_through_namespaces() {
    let doc = Document::parse(
        b"<single-element pfx1:attr='one' pfx2:attr=\"two\" xmlns:pfx1='urn:fish' xmlns:pfx2='urn:fish'/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let err = doc.validate().unwrap_err();
    assert!(matches!(err, Error::DuplicateAttribute { .. }));
}

#[test]
fn same_local_name_different_namespaces_is_fine() {
    let doc = Document::parse(
        b"<e pfx1:attr='one' pfx2:attr=\"two\" xmlns:pfx1='urn:fish' xmlns:pfx2='urn:fowl'/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    doc.validate().unwrap();
}

#[test]
fn resolution_walks_to_the_binding() {
    let doc = Document::parse(
        b"<pfx:single xmlns:pfx='urn:xmpp:example'><pfx:firstchild/><child xmlns='urn:potato'/><pfx:child/></pfx:single>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(root.name(), b"single");
    assert_eq!(root.xmlns().unwrap(), b"urn:xmpp:example");

    // Pure namespace filter.
    let potato = root
        .first_child_where(None, Some(b"urn:potato"))
        .unwrap()
        .unwrap();
    assert_eq!(potato.name(), b"child");
    assert_eq!(potato.xmlns().unwrap(), b"urn:potato");

    // Unfiltered first child.
    let first = root.first_child().unwrap();
    assert_eq!(first.name(), b"firstchild");
    assert_eq!(first.xmlns().unwrap(), b"urn:xmpp:example");

    // Name filter with no namespace defaults to "same namespace as me":
    // the urn:potato child is passed over for the pfx: one.
    let child = root
        .first_child_where(Some(b"child"), None)
        .unwrap()
        .unwrap();
    assert_eq!(child.name(), b"child");
    assert_eq!(child.xmlns().unwrap(), b"urn:xmpp:example");
    assert_eq!(child.prefix(), b"pfx");

    doc.validate().unwrap();
}

#[test]
fn last_child_and_sibling_filters() {
    let doc = Document::parse(
        b"<r xmlns='urn:a' xmlns:b='urn:b'><x/><b:x/><x/></r>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let root = doc.root_element().unwrap();

    let last_b = root
        .last_child_where(Some(b"x"), Some(b"urn:b"))
        .unwrap()
        .unwrap();
    assert_eq!(last_b.prefix(), b"b");

    let first = root.first_child().unwrap();
    let next_in_b = first
        .next_sibling_where(Some(b"x"), Some(b"urn:b"))
        .unwrap()
        .unwrap();
    assert_eq!(next_in_b, last_b);

    let last = root.last_child().unwrap();
    let prev_in_default = last
        .prev_sibling_where(Some(b"x"), None)
        .unwrap()
        .unwrap();
    assert_eq!(prev_in_default, first);
}

#[test]
fn reserved_prefixes_resolve_without_bindings() {
    let doc = Document::parse(
        b"<e xml:lang='en' xmlns:custom='urn:c' custom:a='1'/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let root = doc.root_element().unwrap();

    let lang = root
        .first_attribute_where(Some(b"xml:lang"), None)
        .unwrap()
        .unwrap();
    assert_eq!(lang.xmlns().unwrap(), ns::XML);
    assert_eq!(lang.local_name(), b"lang");
    assert_eq!(lang.prefix(), b"xml");

    let binding = root
        .first_attribute_where(Some(b"xmlns:custom"), None)
        .unwrap()
        .unwrap();
    assert_eq!(binding.xmlns().unwrap(), ns::XMLNS);

    doc.validate().unwrap();
}

#[test]
fn unprefixed_attribute_is_in_no_namespace() {
    let doc = Document::parse(
        b"<e xmlns='urn:default' attr='v'/>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(root.xmlns().unwrap(), b"urn:default");
    let attr = root
        .first_attribute_where(Some(b"attr"), None)
        .unwrap()
        .unwrap();
    assert_eq!(attr.xmlns().unwrap(), b"");
}

#[test]
fn shadowed_bindings_use_the_nearest() {
    let doc = Document::parse(
        b"<a xmlns:p='urn:outer'><b xmlns:p='urn:inner'><p:c/></b><p:d/></a>",
        ParseFlags::DEFAULT,
    )
    .unwrap();
    let a = doc.root_element().unwrap();
    let b = a.first_child().unwrap();
    let c = b.first_child().unwrap();
    let d = a.last_child().unwrap();

    assert_eq!(c.xmlns().unwrap(), b"urn:inner");
    assert_eq!(d.xmlns().unwrap(), b"urn:outer");
}

#[test]
fn validation_passes_on_full_flag_during_parse() {
    Document::parse(
        b"<pfx:e xmlns:pfx='urn:x' pfx:a='1' b='2'><pfx:kid/></pfx:e>",
        ParseFlags::FULL,
    )
    .unwrap();
}

#[test]
fn validation_during_parse_rejects_duplicates() {
    let err = Document::parse(
        b"<e attr='one' attr='two'/>",
        ParseFlags::VALIDATE_XMLNS,
    )
    .unwrap_err();
    assert!(matches!(err, Error::DuplicateAttribute { .. }));
}
