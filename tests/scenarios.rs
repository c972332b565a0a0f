//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! End-to-end scenarios against literal byte-exact bplist00 documents.

use keyed_bplist::archive::UnarchivedModel;
use keyed_bplist::value::Value;
use keyed_bplist::{Error, PlistReader};

struct DocumentBuilder {
    data: Vec<u8>,
}

impl DocumentBuilder {
    fn new() -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(b"bplist00");
        DocumentBuilder { data }
    }

    fn object(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    fn finish(mut self, object_offsets: &[u8], top_object_index: u64) -> Vec<u8> {
        let offset_table_start = self.data.len();
        self.data.extend_from_slice(object_offsets);

        self.data.extend_from_slice(&[0u8; 5]); // unused trailer preamble
        self.data.push(0); // sort_version
        self.data.push(1); // offsetIntSize
        self.data.push(1); // objRefSize
        self.data.extend_from_slice(&(object_offsets.len() as u64).to_be_bytes()); // numObjects
        self.data.extend_from_slice(&top_object_index.to_be_bytes());
        self.data.extend_from_slice(&(offset_table_start as u64).to_be_bytes());

        self.data
    }
}

#[test]
fn s1_empty_string() {
    let data = DocumentBuilder::new().object(&[0x50]).finish(&[8], 0);
    let reader = PlistReader::from_bytes(&data).unwrap();
    assert_eq!(reader.plist_root, Value::AsciiString(vec![]));
}

#[test]
fn s2_single_integer() {
    let data = DocumentBuilder::new().object(&[0x11, 0x01, 0x2C]).finish(&[8], 0);
    let reader = PlistReader::from_bytes(&data).unwrap();
    assert_eq!(reader.plist_root, Value::Int(300));
}

#[test]
fn s3_two_element_array_of_bools() {
    let data = DocumentBuilder::new()
        .object(&[0x09])
        .object(&[0x08])
        .object(&[0xA2, 0x00, 0x01])
        .finish(&[8, 9, 10], 2);
    let reader = PlistReader::from_bytes(&data).unwrap();
    assert_eq!(
        reader.plist_root,
        Value::Array(vec![Value::Bool(true), Value::Bool(false)])
    );
}

#[test]
fn s4_one_entry_dict_with_string_key() {
    let data = DocumentBuilder::new()
        .object(&[0x51, b'k'])
        .object(&[0x10, 0x07])
        .object(&[0xD1, 0x00, 0x01])
        .finish(&[8, 10, 12], 2);
    let reader = PlistReader::from_bytes(&data).unwrap();
    assert_eq!(
        reader.plist_root,
        Value::Dict(vec![(Value::AsciiString(b"k".to_vec()), Value::Int(7))])
    );
}

#[test]
fn s5_ill_formed_header() {
    let mut data = b"ZZZZZZ00".to_vec();
    data.extend_from_slice(&[0u8; 32]);
    assert_eq!(PlistReader::from_bytes(&data), Err(Error::NotValidPlistFile));
}

#[test]
fn s6_minimal_keyed_archive_recognition() {
    fn ascii(value: &str) -> Value {
        Value::AsciiString(value.as_bytes().to_vec())
    }

    let objects = Value::Array(vec![
        ascii("$null"),
        Value::Dict(vec![
            (ascii("$class"), Value::Uid(2)),
            (ascii("greeting"), ascii("hi")),
        ]),
        Value::Dict(vec![
            (ascii("$classname"), ascii("Greeter")),
            (ascii("$classes"), Value::Array(vec![ascii("Greeter"), ascii("NSObject")])),
        ]),
    ]);

    let root = Value::Dict(vec![
        (ascii("$archiver"), ascii("NSKeyedArchiver")),
        (ascii("$version"), Value::Int(100_000)),
        (ascii("$top"), Value::Dict(vec![(ascii("root"), Value::Uid(1))])),
        (ascii("$objects"), objects),
    ]);

    let model = UnarchivedModel::from_value(&root);
    assert!(model.is_valid);

    let root_instance = model.objects_by_index.get(&model.root.unwrap()).unwrap();
    assert_eq!(root_instance.class.classname, "Greeter");

    let greeting = root_instance
        .members
        .iter()
        .find(|(name, _)| name == "greeting")
        .map(|(_, value)| value.clone());
    assert_eq!(greeting, Some(keyed_bplist::archive::UnarchivedValue::String("hi".to_string())));
}
