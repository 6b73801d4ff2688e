//! InMemory Client Registry 実装
//!
//! ドメイン層が定義する ClientRegistry trait の具体的な実装。
//! DashMap をインメモリ DB として使用します。
//!
//! DashMap はシャード単位でロックを取るため、イテレーション中に同じマップを
//! 変更するとデッドロックします。ブロードキャストは必ず `snapshot_except` で
//! スナップショットを取ってから配送・削除を行います。

use dashmap::DashMap;

use crate::domain::{ClientName, ClientRegistry, Endpoint};

/// インメモリ Client Registry 実装
///
/// ClientName → Endpoint の対応を保持します。
/// ドメイン層の ClientRegistry trait を実装します（依存性の逆転）。
#[derive(Debug, Default)]
pub struct InMemoryClientRegistry {
    clients: DashMap<ClientName, Endpoint>,
}

impl InMemoryClientRegistry {
    /// 新しい InMemoryClientRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientRegistry for InMemoryClientRegistry {
    fn register(&self, name: ClientName, endpoint: Endpoint) -> Option<Endpoint> {
        // 同じエンドポイントの再登録は置き換えとして扱わない
        self.clients
            .insert(name, endpoint.clone())
            .filter(|previous| !previous.same_as(&endpoint))
    }

    fn remove_if_current(&self, name: &ClientName, endpoint: &Endpoint) -> Option<Endpoint> {
        self.clients
            .remove_if(name, |_, current| current.same_as(endpoint))
            .map(|(_, removed)| removed)
    }

    fn lookup(&self, name: &ClientName) -> Option<Endpoint> {
        self.clients.get(name).map(|entry| entry.value().clone())
    }

    fn names(&self) -> Vec<ClientName> {
        let mut names: Vec<ClientName> = self
            .clients
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    fn snapshot_except(&self, excluded: &ClientName) -> Vec<(ClientName, Endpoint)> {
        self.clients
            .iter()
            .filter(|entry| entry.key() != excluded)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn drain(&self) -> Vec<(ClientName, Endpoint)> {
        let mut drained = Vec::with_capacity(self.clients.len());
        self.clients.retain(|name, endpoint| {
            drained.push((name.clone(), endpoint.clone()));
            false
        });
        drained
    }

    fn len(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryClientRegistry の登録・置き換え・条件付き削除
    // - 同名登録の競合時に「後勝ち」になり、古いエンドポイントが返ること
    // - 並行アクセス時に names() が接続中の集合と一致すること
    //
    // 【なぜこのテストが必要か】
    // - Registry は「誰が接続中か」の唯一の情報源
    // - 置き換えられたセッションが新しいセッションの登録を消してはならない
    //
    // 【どのようなシナリオをテストするか】
    // 1. 登録と一覧取得
    // 2. 同名での再登録（置き換え）
    // 3. 条件付き削除（自分の登録のみ削除できる）
    // 4. 送信者を除いたスナップショット
    // 5. drain による全削除
    // 6. 並行登録・並行置き換え
    // ========================================

    fn name(value: &str) -> ClientName {
        ClientName::try_from(value).unwrap()
    }

    #[test]
    fn test_register_and_names() {
        // テスト項目: 登録した名前がソート済みで取得できる
        // given (前提条件):
        let registry = InMemoryClientRegistry::new();
        let (rouz, _rx1) = Endpoint::channel(4);
        let (igor, _rx2) = Endpoint::channel(4);

        // when (操作):
        assert!(registry.register(name("rouz"), rouz).is_none());
        assert!(registry.register(name("igor"), igor).is_none());

        // then (期待する結果):
        assert_eq!(registry.names(), vec![name("igor"), name("rouz")]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_same_name_returns_previous() {
        // テスト項目: 同名で登録すると以前のエンドポイントが返され、新しい方が残る
        // given (前提条件):
        let registry = InMemoryClientRegistry::new();
        let (first, _rx1) = Endpoint::channel(4);
        let (second, _rx2) = Endpoint::channel(4);
        registry.register(name("a"), first.clone());

        // when (操作):
        let previous = registry.register(name("a"), second.clone());

        // then (期待する結果):
        assert!(previous.unwrap().same_as(&first));
        assert!(registry.lookup(&name("a")).unwrap().same_as(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_same_endpoint_twice_is_not_a_replacement() {
        // テスト項目: 同じエンドポイントの再登録では置き換えが発生しない
        let registry = InMemoryClientRegistry::new();
        let (endpoint, _rx) = Endpoint::channel(4);
        registry.register(name("a"), endpoint.clone());

        assert!(registry.register(name("a"), endpoint).is_none());
    }

    #[test]
    fn test_remove_if_current() {
        // テスト項目: 現在登録されているエンドポイントの場合のみ削除される
        // given (前提条件):
        let registry = InMemoryClientRegistry::new();
        let (stale, _rx1) = Endpoint::channel(4);
        let (fresh, _rx2) = Endpoint::channel(4);
        registry.register(name("a"), stale.clone());
        registry.register(name("a"), fresh.clone());

        // when (操作): 置き換えられた側が削除を試みる
        let removed_by_stale = registry.remove_if_current(&name("a"), &stale);

        // then (期待する結果): 新しい登録は残る
        assert!(removed_by_stale.is_none());
        assert!(registry.lookup(&name("a")).unwrap().same_as(&fresh));

        // when (操作): 現在の登録者が削除する
        let removed_by_fresh = registry.remove_if_current(&name("a"), &fresh);

        // then (期待する結果):
        assert!(removed_by_fresh.unwrap().same_as(&fresh));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_if_current_unknown_name() {
        // テスト項目: 存在しない名前の削除は何もしない
        let registry = InMemoryClientRegistry::new();
        let (endpoint, _rx) = Endpoint::channel(4);

        assert!(registry.remove_if_current(&name("ghost"), &endpoint).is_none());
    }

    #[test]
    fn test_snapshot_except() {
        // テスト項目: 指定した名前を除いた全エントリが取得できる
        // given (前提条件):
        let registry = InMemoryClientRegistry::new();
        let mut receivers = Vec::new();
        for client in ["alice", "bob", "charlie"] {
            let (endpoint, rx) = Endpoint::channel(4);
            receivers.push(rx);
            registry.register(name(client), endpoint);
        }

        // when (操作):
        let mut snapshot: Vec<String> = registry
            .snapshot_except(&name("bob"))
            .into_iter()
            .map(|(client, _)| client.into_string())
            .collect();
        snapshot.sort();

        // then (期待する結果):
        assert_eq!(snapshot, vec!["alice".to_string(), "charlie".to_string()]);
    }

    #[test]
    fn test_snapshot_allows_mutation_while_held() {
        // テスト項目: スナップショット保持中に登録・削除してもデッドロックしない
        // given (前提条件):
        let registry = InMemoryClientRegistry::new();
        let (a, _rx1) = Endpoint::channel(4);
        let (b, _rx2) = Endpoint::channel(4);
        registry.register(name("a"), a);
        registry.register(name("b"), b);

        // when (操作):
        for (client, endpoint) in registry.snapshot_except(&name("nobody")) {
            registry.remove_if_current(&client, &endpoint);
            let (replacement, _rx) = Endpoint::channel(4);
            registry.register(name("c"), replacement);
        }

        // then (期待する結果):
        assert_eq!(registry.names(), vec![name("c")]);
    }

    #[test]
    fn test_drain() {
        // テスト項目: drain で全エントリが取り出され、Registry は空になる
        // given (前提条件):
        let registry = InMemoryClientRegistry::new();
        let (a, _rx1) = Endpoint::channel(4);
        let (b, _rx2) = Endpoint::channel(4);
        registry.register(name("a"), a);
        registry.register(name("b"), b);

        // when (操作):
        let drained = registry.drain();

        // then (期待する結果):
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.drain().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_registrations() {
        // テスト項目: 異なる名前の並行登録後、names() は登録済みの集合と一致する
        // given (前提条件):
        let registry = Arc::new(InMemoryClientRegistry::new());

        // when (操作): 50 件を並行登録し、偶数番目だけ削除する
        let mut handles = Vec::new();
        for i in 0..50 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (endpoint, rx) = Endpoint::channel(4);
                let client = name(&format!("client-{i:02}"));
                registry.register(client.clone(), endpoint.clone());
                if i % 2 == 0 {
                    registry.remove_if_current(&client, &endpoint);
                }
                rx
            }));
        }
        let mut receivers = Vec::new();
        for handle in handles {
            receivers.push(handle.await.unwrap());
        }

        // then (期待する結果):
        let expected: Vec<ClientName> = (0..50)
            .filter(|i| i % 2 == 1)
            .map(|i| name(&format!("client-{i:02}")))
            .collect();
        assert_eq!(registry.names(), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_name_registration_leaves_one_live_endpoint() {
        // テスト項目: 同名の並行登録では、ちょうど一つのエンドポイントだけが残る
        for _ in 0..20 {
            // given (前提条件):
            let registry = Arc::new(InMemoryClientRegistry::new());
            let (first, _rx1) = Endpoint::channel(4);
            let (second, _rx2) = Endpoint::channel(4);

            // when (操作): 登録し、置き換えられた側を呼び出し側の責務として close する
            let tasks = [first.clone(), second.clone()].map(|endpoint| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    if let Some(previous) = registry.register(name("x"), endpoint) {
                        previous.close();
                    }
                })
            });
            for task in tasks {
                task.await.unwrap();
            }

            // then (期待する結果):
            let current = registry.lookup(&name("x")).unwrap();
            assert!(!current.is_closed());
            let open = [&first, &second]
                .iter()
                .filter(|endpoint| !endpoint.is_closed())
                .count();
            assert_eq!(open, 1);
            assert_eq!(registry.len(), 1);
        }
    }
}
