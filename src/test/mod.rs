mod channel;
mod simulator;

use std::cell::RefCell;
use std::rc::Rc;

use crate::net::{ChannelHandle, Segment, SegmentChannel};
use crate::proto::RdtLayer;

/// 内存通道：由测试决定 `sent` 何时（以及是否）进入对端的 `inbox`
#[derive(Debug, Default)]
pub(crate) struct QueueChannel {
    pub sent: Vec<Segment>,
    pub inbox: Vec<Segment>,
}

impl SegmentChannel for QueueChannel {
    fn send(&mut self, seg: Segment) {
        self.sent.push(seg);
    }

    fn receive(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.inbox)
    }
}

/// 经两条内存通道连接的 client/server
pub(crate) struct Pair {
    pub client: RdtLayer,
    pub server: RdtLayer,
    pub forward: Rc<RefCell<QueueChannel>>,
    pub reverse: Rc<RefCell<QueueChannel>>,
    /// client 每一步发出的段
    pub forward_log: Vec<Vec<Segment>>,
    /// server 每一步发出的段
    pub reverse_log: Vec<Vec<Segment>>,
}

impl Pair {
    pub fn new(data: &str) -> Self {
        let forward = Rc::new(RefCell::new(QueueChannel::default()));
        let reverse = Rc::new(RefCell::new(QueueChannel::default()));
        let fwd: ChannelHandle = forward.clone();
        let rev: ChannelHandle = reverse.clone();

        let mut client = RdtLayer::new();
        client.set_data_to_send(data).expect("valid data");
        client.set_send_channel(fwd.clone());
        client.set_receive_channel(rev.clone());

        let mut server = RdtLayer::new();
        server.set_send_channel(rev);
        server.set_receive_channel(fwd);

        Self {
            client,
            server,
            forward,
            reverse,
            forward_log: Vec::new(),
            reverse_log: Vec::new(),
        }
    }

    /// 一次迭代：双方各 tick 一次，client 发出的每个段经 `fate` 处理后交给 server；
    /// ACK 原样送回。
    pub fn step(&mut self, mut fate: impl FnMut(Segment) -> Vec<Segment>) {
        self.client.tick().expect("client tick");
        self.server.tick().expect("server tick");

        let sent = std::mem::take(&mut self.forward.borrow_mut().sent);
        self.forward_log.push(sent.clone());
        let delivered: Vec<Segment> = sent.into_iter().flat_map(&mut fate).collect();
        self.forward.borrow_mut().inbox.extend(delivered);

        let acks = std::mem::take(&mut self.reverse.borrow_mut().sent);
        self.reverse_log.push(acks.clone());
        self.reverse.borrow_mut().inbox.extend(acks);
    }

    pub fn step_perfect(&mut self) {
        self.step(|s| vec![s]);
    }
}
