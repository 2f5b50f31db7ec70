//! In-memory registry used by the integration tests.
//!
//! Records every connect/open/create/delete/close call and counts handle
//! acquisitions so tests can check ordering and handle hygiene.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use winregistry::error::codes;
use winregistry::{
    AccessMask, ApiResult, Hkey, KeyInfo, KeyPath, OsError, RawValue, RegistryApi, RootKey,
};

/// One recorded API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(RootKey),
    Open { path: String, access: u32 },
    Create { parent: String, tail: String },
    DeleteKey(String),
    Close(u64),
}

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<String, Node>,
    values: Vec<(String, u32, Vec<u8>)>,
    last_write: u64,
}

impl Node {
    fn descend(&self, segments: &[String]) -> Option<&Node> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    fn descend_mut(&mut self, segments: &[String]) -> Option<&mut Node> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get_mut(segment))
    }

    fn ensure(&mut self, segments: &[String]) -> &mut Node {
        segments
            .iter()
            .fold(self, |node, segment| node.children.entry(segment.clone()).or_default())
    }
}

#[derive(Debug, Default)]
struct State {
    roots: HashMap<RootKey, Node>,
    handles: HashMap<u64, (RootKey, Vec<String>)>,
    next_handle: u64,
    calls: Vec<Call>,
    acquired: usize,
    closed: usize,
    unreachable: bool,
    open_failures: HashMap<String, u32>,
    delete_failures: HashMap<String, u32>,
    close_failures: usize,
}

impl State {
    fn issue(&mut self, root: RootKey, segments: Vec<String>) -> Hkey {
        self.next_handle += 1;
        self.acquired += 1;
        self.handles.insert(self.next_handle, (root, segments));
        Hkey(self.next_handle)
    }

    fn target(&self, hkey: Hkey) -> ApiResult<(RootKey, Vec<String>)> {
        self.handles
            .get(&hkey.0)
            .cloned()
            .ok_or_else(|| OsError::new(codes::ERROR_INVALID_HANDLE, "The handle is invalid"))
    }

    fn node(&self, hkey: Hkey) -> ApiResult<&Node> {
        let (root, segments) = self.target(hkey)?;
        self.roots
            .get(&root)
            .and_then(|node| node.descend(&segments))
            .ok_or_else(not_found)
    }

    fn node_mut(&mut self, hkey: Hkey) -> ApiResult<&mut Node> {
        let (root, segments) = self.target(hkey)?;
        self.roots
            .get_mut(&root)
            .and_then(|node| node.descend_mut(&segments))
            .ok_or_else(not_found)
    }
}

fn not_found() -> OsError {
    OsError::new(codes::ERROR_FILE_NOT_FOUND, "The system cannot find the file specified")
}

fn full_path(root: RootKey, segments: &[String]) -> String {
    KeyPath::from_parts(root.name(), segments.to_vec()).to_string()
}

fn parse(path: &str) -> (RootKey, Vec<String>) {
    let key_path = KeyPath::parse(path).expect("test path");
    let root = RootKey::from_name(key_path.root()).expect("test root");
    (root, key_path.segments().to_vec())
}

/// Recording in-memory registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: RefCell<State>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `path` and its ancestors without recording calls.
    pub fn add_key(&self, path: &str) -> &Self {
        let (root, segments) = parse(path);
        self.state
            .borrow_mut()
            .roots
            .entry(root)
            .or_default()
            .ensure(&segments);
        self
    }

    /// Stores a raw value without recording calls.
    pub fn add_value(&self, path: &str, name: &str, type_code: u32, data: &[u8]) -> &Self {
        let (root, segments) = parse(path);
        let mut state = self.state.borrow_mut();
        let node = state.roots.entry(root).or_default().ensure(&segments);
        node.values.retain(|(n, _, _)| !n.eq_ignore_ascii_case(name));
        node.values.push((name.to_string(), type_code, data.to_vec()));
        self
    }

    pub fn set_last_write(&self, path: &str, ticks: u64) {
        let (root, segments) = parse(path);
        self.state
            .borrow_mut()
            .roots
            .entry(root)
            .or_default()
            .ensure(&segments)
            .last_write = ticks;
    }

    pub fn exists(&self, path: &str) -> bool {
        let (root, segments) = parse(path);
        self.state
            .borrow()
            .roots
            .get(&root)
            .and_then(|node| node.descend(&segments))
            .is_some()
    }

    pub fn value(&self, path: &str, name: &str) -> Option<(u32, Vec<u8>)> {
        let (root, segments) = parse(path);
        let state = self.state.borrow();
        let node = state.roots.get(&root)?.descend(&segments)?;
        node.values
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code, data)| (*code, data.clone()))
    }

    pub fn value_names(&self, path: &str) -> Vec<String> {
        let (root, segments) = parse(path);
        let state = self.state.borrow();
        state
            .roots
            .get(&root)
            .and_then(|node| node.descend(&segments))
            .map(|node| node.values.iter().map(|(n, _, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    /// Makes `connect` fail as if the host were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.borrow_mut().unreachable = unreachable;
    }

    /// Makes opening the canonical `path` fail with `code`.
    pub fn fail_open(&self, path: &str, code: u32) {
        self.state
            .borrow_mut()
            .open_failures
            .insert(path.to_string(), code);
    }

    /// Makes deleting the canonical `path` fail with `code`.
    pub fn fail_delete(&self, path: &str, code: u32) {
        self.state
            .borrow_mut()
            .delete_failures
            .insert(path.to_string(), code);
    }

    /// Makes the next `count` close calls fail after releasing the handle.
    pub fn fail_closes(&self, count: usize) {
        self.state.borrow_mut().close_failures = count;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn connects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Connect(_)))
            .count()
    }

    pub fn opened_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Open { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DeleteKey(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn creates(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create { parent, tail } => Some((parent, tail)),
                _ => None,
            })
            .collect()
    }

    /// Successful connect/open/create calls.
    pub fn acquired(&self) -> usize {
        self.state.borrow().acquired
    }

    /// Close calls that released a live handle.
    pub fn closed(&self) -> usize {
        self.state.borrow().closed
    }

    /// Handles acquired and not yet released.
    pub fn live_handles(&self) -> usize {
        self.state.borrow().handles.len()
    }
}

impl RegistryApi for MemoryRegistry {
    fn connect(&self, _host: Option<&str>, root: RootKey) -> ApiResult<Hkey> {
        let mut state = self.state.borrow_mut();
        if state.unreachable {
            return Err(OsError::new(codes::ERROR_BAD_NETPATH, "The network path was not found"));
        }
        state.calls.push(Call::Connect(root));
        state.roots.entry(root).or_default();
        Ok(state.issue(root, Vec::new()))
    }

    fn open_key(&self, parent: Hkey, sub_key: &str, access: AccessMask) -> ApiResult<Hkey> {
        let mut state = self.state.borrow_mut();
        let (root, mut segments) = state.target(parent)?;
        segments.extend(sub_key.split('\\').filter(|s| !s.is_empty()).map(str::to_string));

        let path = full_path(root, &segments);
        state.calls.push(Call::Open {
            path: path.clone(),
            access: access.bits(),
        });

        if let Some(code) = state.open_failures.get(&path) {
            return Err(OsError::from_code(*code));
        }
        let exists = state
            .roots
            .get(&root)
            .and_then(|node| node.descend(&segments))
            .is_some();
        if !exists {
            return Err(not_found());
        }
        Ok(state.issue(root, segments))
    }

    fn create_key(&self, parent: Hkey, sub_key: &str, _access: AccessMask) -> ApiResult<Hkey> {
        let mut state = self.state.borrow_mut();
        let (root, mut segments) = state.target(parent)?;
        state.calls.push(Call::Create {
            parent: full_path(root, &segments),
            tail: sub_key.to_string(),
        });
        segments.extend(sub_key.split('\\').filter(|s| !s.is_empty()).map(str::to_string));
        state.roots.entry(root).or_default().ensure(&segments);
        Ok(state.issue(root, segments))
    }

    fn close(&self, hkey: Hkey) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        if state.handles.remove(&hkey.0).is_none() {
            return Err(OsError::new(codes::ERROR_INVALID_HANDLE, "The handle is invalid"));
        }
        state.closed += 1;
        state.calls.push(Call::Close(hkey.0));
        if state.close_failures > 0 {
            state.close_failures -= 1;
            return Err(OsError::new(1009, "The configuration registry database is corrupt"));
        }
        Ok(())
    }

    fn query_info(&self, hkey: Hkey) -> ApiResult<KeyInfo> {
        let state = self.state.borrow();
        let node = state.node(hkey)?;
        Ok(KeyInfo {
            subkey_count: node.children.len() as u32,
            value_count: node.values.len() as u32,
            last_write_ticks: node.last_write,
        })
    }

    fn enum_key(&self, hkey: Hkey, index: u32) -> ApiResult<String> {
        let state = self.state.borrow();
        let node = state.node(hkey)?;
        node.children
            .keys()
            .nth(index as usize)
            .cloned()
            .ok_or_else(|| OsError::new(codes::ERROR_NO_MORE_ITEMS, "No more data is available"))
    }

    fn enum_value(&self, hkey: Hkey, index: u32) -> ApiResult<RawValue> {
        let state = self.state.borrow();
        let node = state.node(hkey)?;
        node.values
            .get(index as usize)
            .map(|(name, code, data)| RawValue {
                name: name.clone(),
                data: data.clone(),
                type_code: *code,
            })
            .ok_or_else(|| OsError::new(codes::ERROR_NO_MORE_ITEMS, "No more data is available"))
    }

    fn query_value(&self, hkey: Hkey, name: &str) -> ApiResult<(Vec<u8>, u32)> {
        let state = self.state.borrow();
        let node = state.node(hkey)?;
        node.values
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code, data)| (data.clone(), *code))
            .ok_or_else(not_found)
    }

    fn set_value(&self, hkey: Hkey, name: &str, type_code: u32, data: &[u8]) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        let node = state.node_mut(hkey)?;
        match node.values.iter_mut().find(|(n, _, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => {
                slot.1 = type_code;
                slot.2 = data.to_vec();
            }
            None => node.values.push((name.to_string(), type_code, data.to_vec())),
        }
        Ok(())
    }

    fn delete_value(&self, hkey: Hkey, name: &str) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        let node = state.node_mut(hkey)?;
        let position = node
            .values
            .iter()
            .position(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .ok_or_else(not_found)?;
        node.values.remove(position);
        Ok(())
    }

    fn delete_key(&self, hkey: Hkey, name: &str) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        let (root, mut segments) = state.target(hkey)?;
        segments.push(name.to_string());
        let path = full_path(root, &segments);

        if let Some(code) = state.delete_failures.get(&path) {
            return Err(OsError::from_code(*code));
        }

        let node = state.node_mut(hkey)?;
        match node.children.get(name) {
            None => return Err(not_found()),
            Some(child) if !child.children.is_empty() => {
                return Err(OsError::new(codes::ERROR_KEY_HAS_CHILDREN, "Key has subkeys"))
            }
            Some(_) => {}
        }
        node.children.remove(name);
        state.calls.push(Call::DeleteKey(path));
        Ok(())
    }
}
