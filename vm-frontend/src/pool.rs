//! 描述符池
//!
//! 以 arena + 空闲链表的方式管理 [`Descriptor`]。描述符首次在池耗尽时创建，
//! 此后在“空闲”（由池持有）与“活跃”（由某个块的链表持有）之间循环，
//! 在进程生命周期内从不单独销毁。
//!
//! 池不是线程安全的：每个客户机 CPU 应拥有自己的 [`Frontend`](crate::Frontend) 与池。

use vm_core::GuestAddr;

use crate::desc::{DescId, Descriptor};

/// 池使用统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// 曾经分配过的描述符总数（高水位线）
    pub allocated: usize,
    /// 当前空闲的描述符数
    pub free: usize,
    /// 当前被块链表持有的描述符数
    pub live: usize,
}

/// 描述符池
#[derive(Debug, Default)]
pub struct DescriptorPool {
    /// 所有描述符的存储
    slots: Vec<Descriptor>,
    /// 空闲描述符句柄（后进先出）
    free: Vec<DescId>,
}

impl DescriptorPool {
    /// 创建空池
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出一个描述符并将其完全重新初始化到 `pc`
    ///
    /// 优先复用空闲链表；池耗尽时分配新节点。分配失败会直接终止进程。
    pub fn acquire(&mut self, pc: GuestAddr) -> DescId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()].reset(pc);
                id
            }
            None => {
                let id = self.grow(pc);
                tracing::trace!(allocated = self.slots.len(), "descriptor pool grew");
                id
            }
        }
    }

    /// 将单个描述符归还池中
    ///
    /// 调用者保证该节点不再被任何活跃链表引用；重复归还属于调用者契约违规。
    pub fn release(&mut self, id: DescId) {
        debug_assert!(id.index() < self.slots.len());
        self.free.push(id);
    }

    /// 获取描述符
    pub fn get(&self, id: DescId) -> &Descriptor {
        &self.slots[id.index()]
    }

    /// 获取可变描述符
    pub fn get_mut(&mut self, id: DescId) -> &mut Descriptor {
        &mut self.slots[id.index()]
    }

    /// 使用统计
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.slots.len(),
            free: self.free.len(),
            live: self.slots.len() - self.free.len(),
        }
    }

    fn grow(&mut self, pc: GuestAddr) -> DescId {
        let index = u32::try_from(self.slots.len())
            .unwrap_or_else(|_| panic!("descriptor pool exceeded {} entries", u32::MAX));
        self.slots.push(Descriptor::new(pc));
        DescId(index)
    }
}
