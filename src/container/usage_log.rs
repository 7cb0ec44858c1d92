use std::{io::Write, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;

use super::{
    ContainerError, DatasetInfo, Member, ObjectId, ObjectPath, RawAttribute,
    ReadableContainerTraits,
};

/// The usage log container adapter. Logs container method calls.
///
/// It is intended to aid in debugging by revealing the order in which objects are opened, inspected, and closed.
///
/// ### Example (log to stdout)
/// ```rust
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// # use h5cf::container::{MemoryContainerBuilder, UsageLogContainerAdapter};
/// let container = Arc::new(MemoryContainerBuilder::new().build());
/// let log_writer = Arc::new(Mutex::new(
///     // std::io::BufWriter::new(
///     std::io::stdout(),
///     //    )
/// ));
/// let container = UsageLogContainerAdapter::new(container, log_writer, || {
///     chrono::Utc::now().format("[%T%.3f] ").to_string()
/// });
/// ```
///
/// Normalizing a file through the above [`UsageLogContainerAdapter`] prints outputs like:
/// ```text
/// [23:41:19.885] open(/) -> Ok("handle 1")
/// [23:41:19.885] attributes(handle 1) -> Ok("[title, Conventions]")
/// [23:41:19.885] members(handle 1) -> Ok("[lat, lon, temp]")
/// [23:41:19.886] open(/lat) -> Ok("handle 2")
/// [23:41:19.886] dataset_info(handle 2) -> Ok("Float32 Simple([Extent { size: 10, unlimited: false }])")
/// [23:41:19.886] close(handle 2) -> Ok(())
/// ```
pub struct UsageLogContainerAdapter<TContainer: ?Sized> {
    container: Arc<TContainer>,
    handle: Arc<Mutex<dyn Write + Send + Sync>>,
    prefix_func: fn() -> String,
}

impl<TContainer: ?Sized> core::fmt::Debug for UsageLogContainerAdapter<TContainer> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        writeln!(f, "usage log")
    }
}

impl<TContainer: ?Sized> UsageLogContainerAdapter<TContainer> {
    /// Create a new usage log container adapter.
    pub fn new(
        container: Arc<TContainer>,
        handle: Arc<Mutex<dyn Write + Send + Sync>>,
        prefix_func: fn() -> String,
    ) -> Self {
        Self {
            container,
            handle,
            prefix_func,
        }
    }

    fn log(&self, message: std::fmt::Arguments) -> Result<(), ContainerError> {
        writeln!(self.handle.lock(), "{}{message}", (self.prefix_func)())?;
        Ok(())
    }
}

impl<TContainer: ?Sized + ReadableContainerTraits> ReadableContainerTraits
    for UsageLogContainerAdapter<TContainer>
{
    fn open(&self, path: &ObjectPath) -> Result<ObjectId, ContainerError> {
        let result = self.container.open(path);
        self.log(format_args!(
            "open({path}) -> {:?}",
            result.as_ref().map(ToString::to_string)
        ))?;
        result
    }

    fn close(&self, id: ObjectId) -> Result<(), ContainerError> {
        let result = self.container.close(id);
        self.log(format_args!("close({id}) -> {result:?}"))?;
        result
    }

    fn members(&self, group: ObjectId) -> Result<Vec<Member>, ContainerError> {
        let result = self.container.members(group);
        self.log(format_args!(
            "members({group}) -> {:?}",
            result
                .as_ref()
                .map(|members| format!("[{}]", members.iter().map(|m| &m.name).format(", ")))
        ))?;
        result
    }

    fn attributes(&self, object: ObjectId) -> Result<Vec<RawAttribute>, ContainerError> {
        let result = self.container.attributes(object);
        self.log(format_args!(
            "attributes({object}) -> {:?}",
            result.as_ref().map(|attributes| format!(
                "[{}]",
                attributes.iter().map(|a| &a.name).format(", ")
            ))
        ))?;
        result
    }

    fn dataset_info(&self, dataset: ObjectId) -> Result<DatasetInfo, ContainerError> {
        let result = self.container.dataset_info(dataset);
        self.log(format_args!(
            "dataset_info({dataset}) -> {:?}",
            result.as_ref().map(|info| format!("{} {:?}", info.datatype, info.dataspace))
        ))?;
        result
    }

    fn dimension_list(&self, dataset: ObjectId) -> Result<Vec<Vec<ObjectPath>>, ContainerError> {
        let result = self.container.dimension_list(dataset);
        self.log(format_args!(
            "dimension_list({dataset}) -> {:?}",
            result.as_ref().map(|axes| format!(
                "[{}]",
                axes.iter()
                    .map(|scales| scales.iter().format(" "))
                    .format(", ")
            ))
        ))?;
        result
    }

    fn string_values(&self, dataset: ObjectId) -> Result<Vec<String>, ContainerError> {
        let result = self.container.string_values(dataset);
        self.log(format_args!(
            "string_values({dataset}) -> {:?}",
            result.as_ref().map(Vec::len)
        ))?;
        result
    }
}
