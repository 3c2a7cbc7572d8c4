use crate::obj::TbObjSafe;
use crate::{TbResult, TestFn};
use lazy_static::lazy_static;

pub struct TbTests(Vec<TbObjSafe<Test>>);

impl TbTests {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> core::slice::Iter<TbObjSafe<Test>> {
        self.0.iter()
    }
    pub fn push(&mut self, test: Test) {
        self.0.push(TbObjSafe::new(test));
    }
}

#[derive(Debug)]
pub struct Test {
    pub name: String,
    pub generator: TestFn,
    pub result: Option<TbResult>,
    pub time_secs: f64,
    pub sim_time_ns: f64,
}

impl Test {
    pub fn new(name: String, generator: TestFn) -> Self {
        Self {
            name,
            generator,
            result: None,
            time_secs: 0.0,
            sim_time_ns: 0.0,
        }
    }
    pub fn set_result(&mut self, result: TbResult) {
        self.result = Some(result);
    }
}

lazy_static! {
    // replaced wholesale at the start of every run
    pub(crate) static ref TESTS: TbObjSafe<Option<TbTests>> = TbObjSafe::new(None);
}

pub(crate) fn set_tests(tests: TbTests) {
    TESTS.with_mut(|mut t| {
        t.replace(tests);
    });
}

pub(crate) fn test_list() -> Vec<TbObjSafe<Test>> {
    TESTS.with_mut(|t| {
        t.as_ref()
            .expect("no tests registered")
            .iter()
            .cloned()
            .collect()
    })
}
