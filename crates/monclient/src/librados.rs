//! System librados backend
//!
//! Thin bindings over the handful of librados entry points the connection
//! builder needs. Blocking calls (connect, mon_command) run on the blocking
//! thread pool.

use crate::error::{MonClientError, Result};
use crate::library::{ClusterHandle, ClusterLibrary};
use crate::options::Identity;
use async_trait::async_trait;
use auth::CommandResult;
use bytes::Bytes;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr;
use std::sync::Arc;
use tracing::debug;

#[allow(non_camel_case_types)]
type rados_t = *mut c_void;

#[link(name = "rados")]
extern "C" {
    fn rados_create(cluster: *mut rados_t, id: *const c_char) -> c_int;
    fn rados_create2(
        cluster: *mut rados_t,
        clustername: *const c_char,
        name: *const c_char,
        flags: u64,
    ) -> c_int;
    fn rados_conf_read_file(cluster: rados_t, path: *const c_char) -> c_int;
    fn rados_conf_set(cluster: rados_t, option: *const c_char, value: *const c_char) -> c_int;
    fn rados_connect(cluster: rados_t) -> c_int;
    fn rados_shutdown(cluster: rados_t);
    #[allow(clippy::too_many_arguments)]
    fn rados_mon_command(
        cluster: rados_t,
        cmd: *mut *const c_char,
        cmdlen: usize,
        inbuf: *const c_char,
        inbuflen: usize,
        outbuf: *mut *mut c_char,
        outbuflen: *mut usize,
        outs: *mut *mut c_char,
        outslen: *mut usize,
    ) -> c_int;
    fn rados_buffer_free(buf: *mut c_char);
}

/// librados returns negative errno values
fn errno_message(ret: c_int) -> String {
    std::io::Error::from_raw_os_error(-ret).to_string()
}

fn c_string(name: &str, value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| MonClientError::InvalidOption {
        name: name.to_string(),
        message: "contains a NUL byte".to_string(),
    })
}

/// Owned `rados_t`, shut down on drop
#[derive(Debug)]
struct RawCluster(rados_t);

impl RawCluster {
    fn ptr(&self) -> rados_t {
        self.0
    }
}

// librados handles may be used from any thread once created
unsafe impl Send for RawCluster {}
unsafe impl Sync for RawCluster {}

impl Drop for RawCluster {
    fn drop(&mut self) {
        debug!("shutting down librados handle");
        unsafe { rados_shutdown(self.0) }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Librados;

impl ClusterLibrary for Librados {
    fn create(&self, identity: &Identity) -> Result<Box<dyn ClusterHandle>> {
        let mut raw: rados_t = ptr::null_mut();
        let ret = match identity {
            Identity::ClusterAndEntity { cluster, entity } => {
                let cluster = c_string("cluster", cluster)?;
                let name = c_string("entity", &entity.to_string())?;
                unsafe { rados_create2(&mut raw, cluster.as_ptr(), name.as_ptr(), 0) }
            }
            Identity::Entity(entity) if entity.entity_type() == "client" => {
                let id = c_string("entity", entity.id())?;
                unsafe { rados_create(&mut raw, id.as_ptr()) }
            }
            Identity::Entity(entity) => {
                let cluster = c_string("cluster", cephconfig::DEFAULT_CLUSTER)?;
                let name = c_string("entity", &entity.to_string())?;
                unsafe { rados_create2(&mut raw, cluster.as_ptr(), name.as_ptr(), 0) }
            }
            Identity::Default => unsafe { rados_create(&mut raw, ptr::null()) },
        };
        if ret < 0 {
            return Err(MonClientError::Library(errno_message(ret)));
        }

        Ok(Box::new(LibradosHandle {
            raw: Arc::new(RawCluster(raw)),
        }))
    }
}

#[derive(Debug)]
pub struct LibradosHandle {
    raw: Arc<RawCluster>,
}

#[async_trait]
impl ClusterHandle for LibradosHandle {
    fn read_config_file(&mut self, path: &Path) -> Result<()> {
        let config_error = |message: String| MonClientError::ConfigFile {
            path: Some(path.to_path_buf()),
            message,
        };
        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| config_error("path contains a NUL byte".to_string()))?;
        let ret = unsafe { rados_conf_read_file(self.raw.ptr(), c_path.as_ptr()) };
        if ret < 0 {
            return Err(config_error(errno_message(ret)));
        }
        Ok(())
    }

    fn read_default_config(&mut self) -> Result<()> {
        let ret = unsafe { rados_conf_read_file(self.raw.ptr(), ptr::null()) };
        if ret < 0 {
            return Err(MonClientError::ConfigFile {
                path: None,
                message: errno_message(ret),
            });
        }
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        let c_name = c_string(name, name)?;
        let c_value = c_string(name, value)?;
        let ret = unsafe { rados_conf_set(self.raw.ptr(), c_name.as_ptr(), c_value.as_ptr()) };
        if ret < 0 {
            return Err(MonClientError::InvalidOption {
                name: name.to_string(),
                message: errno_message(ret),
            });
        }
        Ok(())
    }

    async fn connect(&mut self) -> Result<()> {
        let raw = Arc::clone(&self.raw);
        let ret = tokio::task::spawn_blocking(move || unsafe { rados_connect(raw.ptr()) })
            .await
            .map_err(|e| MonClientError::Connect(e.to_string()))?;
        if ret < 0 {
            return Err(MonClientError::Connect(errno_message(ret)));
        }
        Ok(())
    }

    async fn mon_command(&self, cmd: &str, inbl: Bytes) -> Result<CommandResult> {
        let raw = Arc::clone(&self.raw);
        let cmd = CString::new(cmd)
            .map_err(|_| MonClientError::Command("command contains a NUL byte".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let mut cmds = [cmd.as_ptr()];
            let mut outbuf: *mut c_char = ptr::null_mut();
            let mut outbuf_len = 0usize;
            let mut outs: *mut c_char = ptr::null_mut();
            let mut outs_len = 0usize;

            let ret = unsafe {
                rados_mon_command(
                    raw.ptr(),
                    cmds.as_mut_ptr(),
                    1,
                    inbl.as_ptr() as *const c_char,
                    inbl.len(),
                    &mut outbuf,
                    &mut outbuf_len,
                    &mut outs,
                    &mut outs_len,
                )
            };

            let outbl = take_buffer(outbuf, outbuf_len);
            let outs = String::from_utf8_lossy(&take_buffer(outs, outs_len)).into_owned();
            CommandResult::new(ret, outs, outbl)
        })
        .await
        .map_err(|e| MonClientError::Command(e.to_string()))
    }
}

/// Copy and free a librados-allocated buffer
fn take_buffer(buf: *mut c_char, len: usize) -> Bytes {
    if buf.is_null() {
        return Bytes::new();
    }
    let bytes = unsafe { Bytes::copy_from_slice(std::slice::from_raw_parts(buf as *const u8, len)) };
    unsafe { rados_buffer_free(buf) };
    bytes
}

/// Version string reported by the linked librados, for diagnostics
pub fn version() -> String {
    extern "C" {
        fn rados_version(major: *mut c_int, minor: *mut c_int, extra: *mut c_int);
    }
    let (mut major, mut minor, mut extra) = (0, 0, 0);
    unsafe { rados_version(&mut major, &mut minor, &mut extra) };
    format!("{}.{}.{}", major, minor, extra)
}
