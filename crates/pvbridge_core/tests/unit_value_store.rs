#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::Arc;

use pvbridge::data::{Dynamic, FieldType, NdArray, ScalarKind, StructType, UnionType, Value, ValueError, ValueOptions};

fn single(kind: ScalarKind) -> Arc<StructType> {
	StructType::builder("").field("f", FieldType::scalar(kind)).build()
}

fn array_of(kind: ScalarKind) -> Arc<StructType> {
	StructType::builder("").field("arr", FieldType::array(kind)).build()
}

fn untouched(ty: Arc<StructType>) -> Value {
	Value::new(ty, Dynamic::None).expect("value builds")
}

#[test]
fn every_scalar_kind_round_trips_and_marks() {
	let samples = [
		(ScalarKind::Bool, Dynamic::Bool(true)),
		(ScalarKind::I8, Dynamic::Int(-12)),
		(ScalarKind::I16, Dynamic::Int(-1200)),
		(ScalarKind::I32, Dynamic::Int(-120_000)),
		(ScalarKind::I64, Dynamic::Int(-12_000_000_000)),
		(ScalarKind::U8, Dynamic::Int(250)),
		(ScalarKind::U16, Dynamic::Int(65_000)),
		(ScalarKind::U32, Dynamic::Int(4_000_000_000)),
		(ScalarKind::U64, Dynamic::UInt(u64::MAX)),
		(ScalarKind::F32, Dynamic::Float(0.25)),
		(ScalarKind::F64, Dynamic::Float(-1.0e300)),
		(ScalarKind::String, Dynamic::from("hello")),
	];

	for (kind, sample) in samples {
		let mut value = untouched(single(kind));
		assert!(!value.changed(Some("f")).expect("known field"), "{kind:?} starts unchanged");

		value.set_path("f", sample.clone()).expect("representable value stores");
		assert_eq!(value.get_path("f").expect("fetch"), sample, "{kind:?} round trip");
		assert!(value.changed(Some("f")).expect("known field"), "{kind:?} marked");
	}
}

#[test]
fn numeric_arrays_round_trip_for_every_element_kind() {
	for kind in ScalarKind::ALL.into_iter().filter(|kind| kind.is_numeric() && *kind != ScalarKind::Bool) {
		let mut value = untouched(array_of(kind));
		value.set_path("arr", vec![1_i64, 2, 3]).expect("list stores");

		let fetched = value.get_path("arr").expect("fetch");
		let array = fetched.as_array().expect("numeric arrays fetch as arrays");
		assert_eq!(array.shape(), [3]);
		assert_eq!(array.data().kind(), kind);

		let back = value.to_list(Some("arr")).expect("fetch");
		let expected = NdArray::vector(array.data().clone());
		assert_eq!(back, Dynamic::Array(expected));
		assert!(value.changed(Some("arr")).expect("known field"));
	}

	let mut value = untouched(array_of(ScalarKind::F64));
	value.set_path("arr", vec![1_i64, 2, 3]).expect("list stores");
	let fetched = value.get_path("arr").expect("fetch");
	assert_eq!(fetched.as_array().and_then(|array| array.data().as_f64()), Some(&[1.0, 2.0, 3.0][..]));
}

#[test]
fn text_arrays_round_trip() {
	let mut value = untouched(array_of(ScalarKind::String));
	value.set_path("arr", vec!["a", "b"]).expect("text list stores");
	assert_eq!(value.get_path("arr").expect("fetch"), Dynamic::from(vec!["a", "b"]));
}

#[test]
fn changed_set_distinguishes_absent_and_empty() {
	let ty = StructType::builder("")
		.field("a", FieldType::scalar(ScalarKind::I32))
		.field("inner", FieldType::Structure(StructType::builder("").field("b", FieldType::scalar(ScalarKind::I32)).build()))
		.build();

	let untracked = Value::untracked(ty.clone(), Dynamic::None).expect("value builds");
	let leaves: BTreeSet<String> = ["a".to_owned(), "inner.b".to_owned()].into();
	assert_eq!(untracked.changed_set().expect("set"), leaves);
	assert!(untracked.changed(Some("a")).expect("known field"));

	let tracked = untouched(ty);
	assert!(tracked.changed_set().expect("set").is_empty());
}

#[test]
fn mark_without_change_set_is_ignored() {
	let mut value = Value::untracked(single(ScalarKind::I32), Dynamic::None).expect("value builds");
	assert!(!value.mark(Some("f"), true).expect("mark is a no-op"));
	assert!(value.change_set().is_none());
	assert!(matches!(value.mark(Some("g"), true), Err(ValueError::Lookup { ref path }) if path == "g"));
}

#[test]
fn mark_and_reset_changes() {
	let mut value = untouched(single(ScalarKind::I32));
	assert!(value.mark(Some("f"), true).expect("known field"));
	assert!(value.changed(Some("f")).expect("known field"));
	assert!(matches!(value.mark(Some("g"), true), Err(ValueError::Lookup { .. })));

	value.reset_changes().expect("reset");
	assert!(!value.changed(Some("f")).expect("known field"));
	assert_eq!(value.change_set().map(|set| set.count()), Some(0));
}

#[test]
fn end_to_end_construction() {
	let ty = StructType::builder("")
		.field("i", FieldType::scalar(ScalarKind::I32))
		.field("s", FieldType::scalar(ScalarKind::String))
		.field("arr", FieldType::array(ScalarKind::I32))
		.build();
	let initial = Dynamic::map([("i", Dynamic::from(5)), ("s", Dynamic::from("hi")), ("arr", Dynamic::from(vec![1_i32, 2, 3]))]);
	let value = Value::new(ty, initial).expect("value builds");

	assert_eq!(value.get_path("i").expect("fetch"), Dynamic::Int(5));
	assert_eq!(value.get_path("s").expect("fetch"), Dynamic::from("hi"));
	assert_eq!(value.get_path("arr").expect("fetch"), Dynamic::Array(NdArray::from(vec![1_i32, 2, 3])));
	assert!(value.changed(Some("i")).expect("known field"));
	assert_eq!(value.len(), 4);
	assert_eq!(value.id(), "");
}

#[test]
fn rejected_shape_leaves_field_untouched() {
	let mut value = untouched(array_of(ScalarKind::F32));
	value.set_path("arr", vec![1.0_f64]).expect("list stores");
	value.reset_changes().expect("reset");

	let grid = NdArray::with_shape(vec![1, 2], vec![1.0_f32, 2.0].into()).expect("shape covers data");
	let err = value.set_path("arr", grid).expect_err("2-d input fails");
	assert!(matches!(err, ValueError::Shape { ref path, ndim: 2 } if path == "arr"));

	assert_eq!(value.get_path("arr").expect("fetch"), Dynamic::Array(NdArray::from(vec![1.0_f32])));
	assert!(!value.changed(Some("arr")).expect("known field"));

	let nested = Dynamic::List(vec![Dynamic::from(vec![1_i32, 2]), Dynamic::from(vec![3_i32, 4])]);
	assert!(matches!(value.set_path("arr", nested), Err(ValueError::Shape { ndim: 2, .. })));
}

#[test]
fn share_aliases_storage_with_independent_changes() {
	let original = untouched(single(ScalarKind::I32));
	let mut clone = original.share();
	clone.set_path("f", 9).expect("clone stores");

	// Writes through a shared clone are visible through the original.
	assert_eq!(original.get_path("f").expect("fetch"), Dynamic::Int(9));
	assert!(clone.changed(Some("f")).expect("known field"));
	assert!(!original.changed(Some("f")).expect("known field"));
	assert!(original.shares_storage(&clone));
}

#[test]
fn detach_copies_storage() {
	let original = untouched(single(ScalarKind::I32));
	let mut copy = original.detach().expect("copy succeeds");
	copy.set_path("f", 9).expect("copy stores");

	assert_eq!(original.get_path("f").expect("fetch"), Dynamic::Int(0));
	assert!(!original.shares_storage(&copy));
}

#[test]
fn unknown_paths_are_lookup_errors() {
	let mut value = untouched(single(ScalarKind::I32));
	let err = value.set_path("nope", 1).expect_err("unknown field");
	assert!(err.is_lookup());
	assert_eq!(err.to_string(), "no field nope");
	assert!(value.get_path("f.g").expect_err("scalar has no sub-fields").is_lookup());
}

#[test]
fn structure_arrays_are_unsupported() {
	let row = StructType::builder("row").field("x", FieldType::scalar(ScalarKind::I32)).build();
	let ty = StructType::builder("").field("rows", FieldType::StructureArray(row)).build();
	let mut value = untouched(ty);

	assert!(matches!(value.set_path("rows", Dynamic::List(Vec::new())), Err(ValueError::Unsupported { .. })));
	assert!(matches!(value.get_path("rows"), Err(ValueError::Unsupported { .. })));
}

#[test]
fn legacy_storage_cannot_clear_unions() {
	let ty = StructType::builder("").field("u", FieldType::any()).build();
	let mut value = Value::with_options(ty, Dynamic::None, ValueOptions::legacy_storage()).expect("value builds");
	value.set_path("u", 1).expect("variant store");

	let err = value.set_path("u", Dynamic::None).expect_err("legacy storage cannot clear");
	assert!(matches!(err, ValueError::Unsupported { .. }));
	value.select("u", None).expect("explicit clear still works");
	assert_eq!(value.get_path("u").expect("fetch"), Dynamic::None);
}

#[test]
fn union_arrays_fetch_members_in_order() {
	let choice = UnionType::builder("choice")
		.member("a", FieldType::scalar(ScalarKind::I32))
		.member("b", FieldType::scalar(ScalarKind::String))
		.build();
	let ty = StructType::builder("").field("list", FieldType::UnionArray(choice)).build();
	let mut value = untouched(ty);

	let items = Dynamic::List(vec![Dynamic::Int(1), Dynamic::None, Dynamic::from("x"), Dynamic::selector("b", 2)]);
	value.set_path("list", items).expect("union array stores");

	let expected = Dynamic::List(vec![Dynamic::Int(1), Dynamic::None, Dynamic::from("x"), Dynamic::from("2")]);
	assert_eq!(value.get_path("list").expect("fetch"), expected);
	assert!(value.changed(Some("list")).expect("known field"));
}

#[test]
fn structure_field_accepts_container_of_equal_type() {
	let point = || StructType::builder("point").field("x", FieldType::scalar(ScalarKind::F64)).field("y", FieldType::scalar(ScalarKind::F64)).build();
	let ty = StructType::builder("").field("p", FieldType::Structure(point())).build();
	let source = Value::new(point(), Dynamic::map([("x", 1.0), ("y", 2.0)])).expect("source builds");

	let mut value = untouched(ty);
	value.set_path("p", source.clone()).expect("equal type copies");
	assert_eq!(value.get_path("p.y").expect("fetch"), Dynamic::Float(2.0));
	assert_eq!(value.changed_set().expect("set"), ["p.x".to_owned(), "p.y".to_owned()].into());
	assert!(!value.get_path("p").expect("fetch").as_value().is_some_and(|view| view.shares_storage(&source)));

	let other = Value::new(StructType::builder("other").build(), Dynamic::None).expect("other builds");
	assert!(matches!(value.set_path("p", other), Err(ValueError::TypeMismatch { ref path, .. }) if path == "p"));
}
