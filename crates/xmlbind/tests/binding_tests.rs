#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use xmlbind::{
    bind, bind_with_options, parse, render, unbind, unbind_with_options, BindOptions, Error,
    ErrorKind, FieldDescriptor, ItemKind, Object, ObjectRef, Registry, ScalarType,
    TypeDeclaration, Value,
};

fn registry() -> Registry {
    let registry = Registry::new();
    registry.declare(
        TypeDeclaration::new("person")
            .field(FieldDescriptor::attribute("age", ScalarType::Integer))
            .field(FieldDescriptor::child("name", ScalarType::String)),
    );
    registry.declare(
        TypeDeclaration::new("library")
            .field(FieldDescriptor::attribute("name", ScalarType::String))
            .field(FieldDescriptor::collection("book", ItemKind::object("book"))),
    );
    registry.declare(
        TypeDeclaration::new("book")
            .field(FieldDescriptor::attribute("isbn", ScalarType::String))
            .field(FieldDescriptor::child("title", ScalarType::String))
            .field(FieldDescriptor::child("year", ScalarType::Integer).optional())
            .field(FieldDescriptor::collection(
                "tag",
                ItemKind::Scalar(ScalarType::String),
            )),
    );
    registry.declare(
        TypeDeclaration::new("price")
            .field(FieldDescriptor::attribute("currency", ScalarType::String).with_default("EUR"))
            .field(FieldDescriptor::text("amount", ScalarType::Float)),
    );
    registry.declare(
        TypeDeclaration::new("server")
            .field(FieldDescriptor::child("port", ScalarType::Integer).with_default(8080_i64))
            .field(FieldDescriptor::child("secure", ScalarType::Boolean).with_default(false))
            .field(FieldDescriptor::collection("host", ItemKind::Scalar(ScalarType::String)).required()),
    );
    registry.declare(
        TypeDeclaration::new("node")
            .field(FieldDescriptor::attribute("id", ScalarType::Integer))
            .field(FieldDescriptor::nested("next", "node").optional()),
    );
    registry.declare(
        TypeDeclaration::new("note")
            .field(FieldDescriptor::attribute("id", ScalarType::Integer))
            .field(FieldDescriptor::text("body", ScalarType::String).optional()),
    );
    registry.declare(
        TypeDeclaration::new("reading")
            .field(FieldDescriptor::attribute("unit", ScalarType::String))
            .field(FieldDescriptor::text("value", ScalarType::Float).with_default(0.0)),
    );
    registry.declare(
        TypeDeclaration::new("shelf")
            .field(FieldDescriptor::collection("item", ItemKind::object("widget"))),
    );
    registry
}

fn bind_str(text: &str, type_name: &str, registry: &Registry) -> Result<ObjectRef, Error> {
    bind(&parse(text)?.root, type_name, registry)
}

fn failure(result: Result<impl std::fmt::Debug, Error>) -> (ErrorKind, String) {
    let err = result.expect_err("binding should fail");
    let path = err.path().map(ToString::to_string).unwrap_or_default();
    (err.kind().clone(), path)
}

#[test]
fn test_person_round_trip_is_byte_exact() -> Result<(), Error> {
    let registry = registry();
    let text = r#"<person age="30"><name>Ada</name></person>"#;

    let person = bind_str(text, "person", &registry)?;
    assert_eq!(
        person,
        ObjectRef::new(Object::new("person").with("age", 30_i64).with("name", "Ada"))
    );

    let element = unbind(&person, "person", &registry)?;
    assert_eq!(render(&element), text);
    Ok(())
}

#[test]
fn test_missing_required_attribute() {
    let registry = registry();
    assert_eq!(
        failure(bind_str("<person><name>Ada</name></person>", "person", &registry)),
        (ErrorKind::MissingField, "person.age".to_string())
    );
}

#[test]
fn test_missing_required_child() {
    let registry = registry();
    assert_eq!(
        failure(bind_str(r#"<person age="30"/>"#, "person", &registry)),
        (ErrorKind::MissingField, "person.name".to_string())
    );
}

#[test]
fn test_type_mismatch_carries_raw_text() {
    let registry = registry();
    assert_eq!(
        failure(bind_str(
            r#"<person age="thirty"><name>Ada</name></person>"#,
            "person",
            &registry
        )),
        (
            ErrorKind::TypeMismatch {
                raw: "thirty".to_string()
            },
            "person.age".to_string()
        )
    );
}

#[test]
fn test_root_tag_must_match() {
    let registry = registry();
    let (kind, path) = failure(bind_str(
        r#"<human age="30"><name>Ada</name></human>"#,
        "person",
        &registry,
    ));
    assert_eq!(
        kind,
        ErrorKind::TypeMismatch {
            raw: "human".to_string()
        }
    );
    assert_eq!(path, "human");
}

#[test]
fn test_undeclared_type_is_unsupported() {
    let registry = registry();
    let err = bind_str("<ghost/>", "ghost", &registry).expect_err("ghost is not declared");
    assert_eq!(
        err.kind(),
        &ErrorKind::UnsupportedType {
            type_name: "ghost".to_string()
        }
    );
    assert!(!err.is_binding_error());
}

#[test]
fn test_collections_keep_document_order() -> Result<(), Error> {
    let registry = registry();
    let library = bind_str(
        r#"<library name="City">
  <book isbn="1"><title>Dune</title><year>1965</year><tag>scifi</tag><tag>classic</tag></book>
  <book isbn="2"><title>Emma</title></book>
</library>"#,
        "library",
        &registry,
    )?;

    let library = library.read();
    assert_eq!(library.get_str("name"), Some("City"));
    let books = library.get_list("book").unwrap();
    assert_eq!(books.len(), 2);

    let dune = books[0].as_object().unwrap().read();
    assert_eq!(dune.get_str("title"), Some("Dune"));
    assert_eq!(dune.get_i64("year"), Some(1965));
    assert_eq!(
        dune.get_list("tag"),
        Some(&[Value::from("scifi"), Value::from("classic")][..])
    );

    let emma = books[1].as_object().unwrap().read();
    assert!(!emma.contains("year"));
    assert_eq!(emma.get_list("tag"), Some(&[][..]));
    Ok(())
}

#[test]
fn test_error_path_indexes_collection_items() {
    let registry = registry();
    assert_eq!(
        failure(bind_str(
            r#"<library name="x"><book isbn="1"><title>A</title></book><book isbn="2"/></library>"#,
            "library",
            &registry
        )),
        (ErrorKind::MissingField, "library.book[1].title".to_string())
    );
}

#[test]
fn test_defaults_fill_absent_fields() -> Result<(), Error> {
    let registry = registry();
    let server = bind_str("<server><host>a</host></server>", "server", &registry)?;
    let server = server.read();
    assert_eq!(server.get_i64("port"), Some(8080));
    assert_eq!(server.get_bool("secure"), Some(false));

    let price = bind_str("<price>9.5</price>", "price", &registry)?;
    assert_eq!(price.read().get_str("currency"), Some("EUR"));
    Ok(())
}

#[test]
fn test_required_collection_must_not_be_empty() {
    let registry = registry();
    assert_eq!(
        failure(bind_str("<server><port>1</port></server>", "server", &registry)),
        (ErrorKind::MissingField, "server.host".to_string())
    );
}

#[test]
fn test_text_content_binding() -> Result<(), Error> {
    let registry = registry();
    let price = bind_str(r#"<price currency="USD"> 12.25 </price>"#, "price", &registry)?;
    assert_eq!(price.read().get_f64("amount"), Some(12.25));

    let element = unbind(&price, "price", &registry)?;
    assert_eq!(render(&element), r#"<price currency="USD">12.25</price>"#);

    assert_eq!(
        failure(bind_str("<price/>", "price", &registry)),
        (
            ErrorKind::TypeMismatch { raw: String::new() },
            "price.amount".to_string()
        )
    );
    Ok(())
}

#[test]
fn test_optional_text_content_may_be_absent() -> Result<(), Error> {
    let registry = registry();
    for text in [r#"<note id="1"/>"#, r#"<note id="1">  </note>"#] {
        let note = bind_str(text, "note", &registry)?;
        assert!(!note.read().contains("body"));
        assert_eq!(render(&unbind(&note, "note", &registry)?), r#"<note id="1"/>"#);
    }

    let note = bind_str(r#"<note id="2">hi there</note>"#, "note", &registry)?;
    assert_eq!(note.read().get_str("body"), Some("hi there"));
    Ok(())
}

#[test]
fn test_text_content_default_fills_empty_element() -> Result<(), Error> {
    let registry = registry();
    let reading = bind_str(r#"<reading unit="C"/>"#, "reading", &registry)?;
    assert_eq!(reading.read().get_f64("value"), Some(0.0));

    let reading = bind_str(r#"<reading unit="C">21.5</reading>"#, "reading", &registry)?;
    assert_eq!(reading.read().get_f64("value"), Some(21.5));

    // present but unparsable text is still a mismatch
    assert_eq!(
        failure(bind_str(r#"<reading unit="C">warm</reading>"#, "reading", &registry)),
        (
            ErrorKind::TypeMismatch {
                raw: "warm".to_string()
            },
            "reading.value".to_string()
        )
    );
    Ok(())
}

#[test]
fn test_undeclared_nested_type_reports_its_path() {
    let registry = registry();
    let unsupported = ErrorKind::UnsupportedType {
        type_name: "widget".to_string(),
    };
    assert_eq!(
        failure(bind_str("<shelf><item/></shelf>", "shelf", &registry)),
        (unsupported.clone(), "shelf.item[0]".to_string())
    );

    let shelf = ObjectRef::new(
        Object::new("shelf").with("item", vec![Value::from(ObjectRef::new(Object::new("widget")))]),
    );
    assert_eq!(
        failure(unbind(&shelf, "shelf", &registry)),
        (unsupported, "shelf.item[0]".to_string())
    );
}

#[test]
fn test_lenient_mode_ignores_unknown_markup() -> Result<(), Error> {
    let registry = registry();
    let person = bind_str(
        r#"<person age="30" extra="1"><name>Ada</name><name>Bob</name><hobby/>stray</person>"#,
        "person",
        &registry,
    )?;
    assert_eq!(person.read().get_str("name"), Some("Ada"));
    Ok(())
}

#[test]
fn test_strict_mode_rejects_unknown_markup() -> Result<(), Error> {
    let registry = registry();
    let strict = |text: &str| -> Result<ObjectRef, Error> {
        bind_with_options(&parse(text)?.root, "person", &registry, BindOptions::strict())
    };

    assert_eq!(
        failure(strict(r#"<person age="30" extra="1"><name>Ada</name></person>"#)),
        (ErrorKind::UnexpectedField, "person.extra".to_string())
    );
    assert_eq!(
        failure(strict(r#"<person age="30"><name>Ada</name><hobby/></person>"#)),
        (ErrorKind::UnexpectedField, "person.hobby".to_string())
    );
    assert_eq!(
        failure(strict(r#"<person age="30"><name>Ada</name><name>Bob</name></person>"#)),
        (ErrorKind::UnexpectedField, "person.name".to_string())
    );
    assert_eq!(
        failure(strict(r#"<person age="30"><name>Ada</name>stray</person>"#)),
        (ErrorKind::UnexpectedField, "person.#text".to_string())
    );
    assert_eq!(
        failure(strict(r#"<person age="30"><name lang="en">Ada</name></person>"#)),
        (ErrorKind::UnexpectedField, "person.name.lang".to_string())
    );

    // namespace declarations and formatting whitespace are not fields
    strict(
        r#"<person xmlns="urn:people" age="30">
  <name>Ada</name>
</person>"#,
    )?;
    Ok(())
}

#[test]
fn test_unbind_rejects_missing_and_mistyped_fields() {
    let registry = registry();

    let missing = ObjectRef::new(Object::new("person").with("name", "Ada"));
    assert_eq!(
        failure(unbind(&missing, "person", &registry)),
        (ErrorKind::MissingField, "person.age".to_string())
    );

    let mistyped = ObjectRef::new(Object::new("person").with("age", "30").with("name", "Ada"));
    let (kind, path) = failure(unbind(&mistyped, "person", &registry));
    assert!(matches!(kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(path, "person.age");

    let wrong_type = ObjectRef::new(Object::new("book").with("isbn", "1").with("title", "A"));
    let (kind, _) = failure(unbind(&wrong_type, "person", &registry));
    assert!(matches!(kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn test_unbind_strict_rejects_unknown_object_fields() -> Result<(), Error> {
    let registry = registry();
    let person = ObjectRef::new(
        Object::new("person")
            .with("age", 30_i64)
            .with("name", "Ada")
            .with("email", "ada@example.com"),
    );

    let element = unbind(&person, "person", &registry)?;
    assert_eq!(render(&element), r#"<person age="30"><name>Ada</name></person>"#);

    assert_eq!(
        failure(unbind_with_options(&person, "person", &registry, BindOptions::strict())),
        (ErrorKind::UnexpectedField, "person.email".to_string())
    );
    Ok(())
}

#[test]
fn test_cycles_are_rejected() {
    let registry = registry();
    let first = ObjectRef::new(Object::new("node").with("id", 1_i64));
    let second = ObjectRef::new(Object::new("node").with("id", 2_i64).with("next", first.clone()));
    first.write().set("next", second.clone());

    assert_eq!(
        failure(unbind(&first, "node", &registry)),
        (ErrorKind::CyclicReference, "node.next.next".to_string())
    );

    // break the cycle so both handles are freed
    first.write().remove("next");
}

#[test]
fn test_shared_objects_are_written_once_per_reference() -> Result<(), Error> {
    let registry = registry();
    let book = ObjectRef::new(Object::new("book").with("isbn", "1").with("title", "Dune"));
    let library = ObjectRef::new(
        Object::new("library")
            .with("name", "City")
            .with("book", vec![Value::from(book.clone()), Value::from(book)]),
    );

    let element = unbind(&library, "library", &registry)?;
    assert_eq!(
        render(&element),
        r#"<library name="City"><book isbn="1"><title>Dune</title></book><book isbn="1"><title>Dune</title></book></library>"#
    );
    Ok(())
}

#[test]
fn test_escaped_content_round_trips() -> Result<(), Error> {
    let registry = registry();
    let text = r#"<book isbn="a&quot;b"><title>Tom &amp; Jerry &lt;3</title></book>"#;
    let book = bind_str(text, "book", &registry)?;
    assert_eq!(book.read().get_str("isbn"), Some("a\"b"));
    assert_eq!(book.read().get_str("title"), Some("Tom & Jerry <3"));
    assert_eq!(render(&unbind(&book, "book", &registry)?), text);
    Ok(())
}

#[test]
fn test_empty_string_child_renders_self_closing() -> Result<(), Error> {
    let registry = registry();
    let person = ObjectRef::new(Object::new("person").with("age", 1_i64).with("name", ""));
    let text = render(&unbind(&person, "person", &registry)?);
    assert_eq!(text, r#"<person age="1"><name/></person>"#);
    assert_eq!(bind_str(&text, "person", &registry)?, person);
    Ok(())
}
