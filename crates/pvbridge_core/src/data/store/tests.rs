mod scalar_fields {

	use crate::data::instance::{Instance, Slot};
	use crate::data::scalar::Scalar;
	use crate::data::store::{StoreCx, store_field};
	use crate::data::{ChangeSet, Dynamic, FieldType, ScalarKind, StructType, ValueError, ValueOptions};

	fn record() -> FieldType {
		FieldType::Structure(
			StructType::builder("record")
				.field("count", FieldType::scalar(ScalarKind::U8))
				.field("label", FieldType::scalar(ScalarKind::String))
				.field("flag", FieldType::scalar(ScalarKind::Bool))
				.build(),
		)
	}

	#[test]
	fn scalar_store_narrows_and_marks_own_offset() {
		let mut inst = Instance::new(&record());
		let mut changes = ChangeSet::new(inst.layout().len());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(Some(&mut changes), &options);

		store_field(&mut inst, 1, &Dynamic::Int(258), &mut cx).expect("int stores into uint8");
		assert!(matches!(inst.slot(1), Slot::Scalar(Scalar::U8(2))));
		assert_eq!(changes.iter().collect::<Vec<_>>(), [1]);
	}

	#[test]
	fn numbers_format_into_text_fields() {
		let mut inst = Instance::new(&record());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		store_field(&mut inst, 2, &Dynamic::Float(1.5), &mut cx).expect("float formats");
		assert!(matches!(inst.slot(2), Slot::Scalar(Scalar::String(text)) if text == "1.5"));
	}

	#[test]
	fn mismatch_names_field_and_host_type() {
		let mut inst = Instance::new(&record());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let err = store_field(&mut inst, 3, &Dynamic::List(Vec::new()), &mut cx).expect_err("list is not a bool");
		assert_eq!(err.to_string(), "can't assign field flag with list");
		assert!(matches!(err, ValueError::TypeMismatch { .. }));
	}
}

mod structure_fields {

	use crate::data::instance::{Instance, Slot};
	use crate::data::scalar::Scalar;
	use crate::data::store::{StoreCx, store_field};
	use crate::data::{ChangeSet, Dynamic, FieldType, ScalarKind, StructType, ValueError, ValueOptions};

	fn nested() -> FieldType {
		let limits = StructType::builder("limits_t")
			.field("low", FieldType::scalar(ScalarKind::F64))
			.field("high", FieldType::scalar(ScalarKind::F64))
			.build();
		FieldType::Structure(
			StructType::builder("root")
				.field("a", FieldType::scalar(ScalarKind::I32))
				.field("limits", FieldType::Structure(limits))
				.field("b", FieldType::scalar(ScalarKind::I32))
				.build(),
		)
	}

	#[test]
	fn mapping_stores_leaves_and_never_marks_structures() {
		let mut inst = Instance::new(&nested());
		let mut changes = ChangeSet::new(inst.layout().len());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(Some(&mut changes), &options);

		let value = Dynamic::map([("limits", Dynamic::map([("high", Dynamic::Float(9.0))]))]);
		store_field(&mut inst, 0, &value, &mut cx).expect("nested mapping stores");

		assert!(matches!(inst.slot(4), Slot::Scalar(Scalar::F64(high)) if *high == 9.0));
		assert_eq!(changes.iter().collect::<Vec<_>>(), [4]);
	}

	#[test]
	fn unknown_key_fails_after_committing_earlier_entries() {
		let mut inst = Instance::new(&nested());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let value = Dynamic::map([("a", Dynamic::Int(1)), ("missing", Dynamic::Int(2)), ("b", Dynamic::Int(3))]);
		let err = store_field(&mut inst, 0, &value, &mut cx).expect_err("missing key fails");

		assert!(matches!(err, ValueError::Lookup { path } if path == "missing"));
		assert!(matches!(inst.slot(1), Slot::Scalar(Scalar::I32(1))));
		assert!(matches!(inst.slot(5), Slot::Scalar(Scalar::I32(0))));
	}

	#[test]
	fn nested_lookup_error_uses_full_name() {
		let mut inst = Instance::new(&nested());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let value = Dynamic::map([("limits", Dynamic::map([("mid", Dynamic::Float(1.0))]))]);
		let err = store_field(&mut inst, 0, &value, &mut cx).expect_err("missing nested key fails");
		assert!(matches!(err, ValueError::Lookup { path } if path == "limits.mid"));
	}

	#[test]
	fn structure_requires_mapping() {
		let mut inst = Instance::new(&nested());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let err = store_field(&mut inst, 2, &Dynamic::Int(1), &mut cx).expect_err("int is not a mapping");
		assert!(matches!(err, ValueError::TypeMismatch { path, got } if path == "limits" && got == "int"));
	}

	#[test]
	fn depth_limit_stops_recursion() {
		let mut inst = Instance::new(&nested());
		let options = ValueOptions {
			max_depth: 1,
			..ValueOptions::default()
		};
		let mut cx = StoreCx::new(None, &options);

		let value = Dynamic::map([("limits", Dynamic::map([("low", Dynamic::Float(1.0))]))]);
		let err = store_field(&mut inst, 0, &value, &mut cx).expect_err("second level exceeds depth");
		assert!(matches!(err, ValueError::DepthExceeded { max_depth: 1 }));
	}
}

mod array_fields {

	use crate::data::instance::{Instance, Slot};
	use crate::data::store::{StoreCx, store_field};
	use crate::data::{ChangeSet, Dynamic, FieldType, NdArray, ScalarKind, StructType, UnionType, ValueError, ValueOptions};

	fn arrays() -> FieldType {
		FieldType::Structure(
			StructType::builder("arrays")
				.field("samples", FieldType::array(ScalarKind::I16))
				.field("names", FieldType::array(ScalarKind::String))
				.field("cells", FieldType::UnionArray(UnionType::variant()))
				.field("rows", FieldType::StructureArray(StructType::builder("row").build()))
				.build(),
		)
	}

	#[test]
	fn numeric_array_store_marks_and_copies() {
		let mut inst = Instance::new(&arrays());
		let mut changes = ChangeSet::new(inst.layout().len());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(Some(&mut changes), &options);

		store_field(&mut inst, 1, &Dynamic::from(vec![1_i64, 2, 3]), &mut cx).expect("list stores");
		let Slot::Array(data) = inst.slot(1) else {
			panic!("expected numeric buffer");
		};
		assert_eq!(data.as_i16(), Some(&[1_i16, 2, 3][..]));
		assert!(changes.get(1));
	}

	#[test]
	fn rejected_shape_leaves_field_untouched() {
		let mut inst = Instance::new(&arrays());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);
		store_field(&mut inst, 1, &Dynamic::from(vec![7_i64]), &mut cx).expect("list stores");

		let grid = NdArray::with_shape(vec![2, 2], vec![1_i16, 2, 3, 4].into()).expect("shape covers data");
		let err = store_field(&mut inst, 1, &Dynamic::Array(grid), &mut cx).expect_err("2-d input fails");

		assert!(matches!(err, ValueError::Shape { ndim: 2, .. }));
		let Slot::Array(data) = inst.slot(1) else {
			panic!("expected numeric buffer");
		};
		assert_eq!(data.as_i16(), Some(&[7_i16][..]));
	}

	#[test]
	fn lazy_text_sequence_is_drained_once() {
		let mut inst = Instance::new(&arrays());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let names = Dynamic::iter(vec![Dynamic::from("a"), Dynamic::from("b")]);
		store_field(&mut inst, 2, &names, &mut cx).expect("lazy sequence stores");
		assert!(matches!(inst.slot(2), Slot::Strings(items) if items.len() == 2));

		let err = store_field(&mut inst, 2, &names, &mut cx).expect_err("second drain fails");
		assert!(matches!(err, ValueError::Consumed { .. }));
	}

	#[test]
	fn union_array_selects_each_element_independently() {
		let mut inst = Instance::new(&arrays());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let value = Dynamic::List(vec![Dynamic::Int(1), Dynamic::None, Dynamic::from("x")]);
		store_field(&mut inst, 3, &value, &mut cx).expect("union array stores");

		let Slot::UnionArray(cells) = inst.slot(3) else {
			panic!("expected union cells");
		};
		let defined: Vec<bool> = cells.iter().map(|cell| cell.is_defined()).collect();
		assert_eq!(defined, [true, false, true]);
	}

	#[test]
	fn structure_arrays_are_unsupported() {
		let mut inst = Instance::new(&arrays());
		let options = ValueOptions::default();
		let mut cx = StoreCx::new(None, &options);

		let err = store_field(&mut inst, 4, &Dynamic::List(Vec::new()), &mut cx).expect_err("structure arrays reject stores");
		assert!(matches!(err, ValueError::Unsupported { path, .. } if path == "rows"));
	}
}
