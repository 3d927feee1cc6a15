use ethers::{
    abi::Token,
    types::{Address, U256},
    utils::to_checksum,
};
use helpers::{deploy_multisig, DeployError, MultisigParams};
use tests::{random_address, FailAt, MockChainClient};

const CO_OWNER: &str = "0x0708C30FF4DD48C5596CbfaCCC030C7b3D67010b";

async fn run(client: &MockChainClient) -> (helpers::Result<helpers::DeployedContract>, String) {
    let mut out = Vec::new();
    let result = deploy_multisig(client, "Multisig", &MultisigParams::default(), &mut out).await;
    (result, String::from_utf8_lossy(&out).into_owned())
}

#[tokio::test]
async fn test_deploy_reports_contract_and_owner() -> anyhow::Result<()> {
    let owner = random_address();
    let contract = random_address();
    let client = MockChainClient::new([owner], contract);

    let (result, stdout) = run(&client).await;
    let deployed = result?;

    assert_eq!(deployed.address, contract);
    assert_eq!(deployed.tx_hash, MockChainClient::tx_hash());
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            format!("MultisigContract deployed to: {}", to_checksum(&contract, None)),
            format!("MultisigContract owner address: {}", to_checksum(&owner, None)),
        ]
    );
    assert_eq!(client.calls().factory_requests, vec!["Multisig".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_empty_signer_list_fails_without_output() -> anyhow::Result<()> {
    let client = MockChainClient::new(Vec::<Address>::new(), random_address());

    let (result, stdout) = run(&client).await;

    assert!(matches!(result, Err(DeployError::NoSigners)), "{result:?}");
    assert!(stdout.is_empty());

    let calls = client.calls();
    assert!(calls.factory_requests.is_empty());
    assert!(calls.deploy_calls.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_node_fails_without_output() -> anyhow::Result<()> {
    let client =
        MockChainClient::new([random_address()], random_address()).failing_at(FailAt::Signers);

    let (result, stdout) = run(&client).await;

    assert!(matches!(result, Err(DeployError::Connectivity(_))), "{result:?}");
    assert!(stdout.is_empty());
    assert!(client.calls().factory_requests.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_artifact_fails_before_deploying() -> anyhow::Result<()> {
    let client =
        MockChainClient::new([random_address()], random_address()).failing_at(FailAt::Factory);

    let (result, stdout) = run(&client).await;

    assert!(matches!(result, Err(DeployError::Artifact(_))), "{result:?}");
    assert!(stdout.is_empty());
    assert!(client.calls().deploy_calls.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rejected_transaction_fails_without_waiting() -> anyhow::Result<()> {
    let client =
        MockChainClient::new([random_address()], random_address()).failing_at(FailAt::Deploy);

    let (result, stdout) = run(&client).await;

    assert!(matches!(result, Err(DeployError::Transaction(_))), "{result:?}");
    assert!(stdout.is_empty());
    assert_eq!(client.calls().confirmation_waits, 0);
    Ok(())
}

#[tokio::test]
async fn test_reverted_deployment_fails_without_output() -> anyhow::Result<()> {
    let client = MockChainClient::new([random_address()], random_address())
        .failing_at(FailAt::Confirmation);

    let (result, stdout) = run(&client).await;

    assert!(matches!(result, Err(DeployError::Confirmation(_))), "{result:?}");
    assert!(stdout.is_empty());

    let calls = client.calls();
    assert_eq!(calls.deploy_calls.len(), 1);
    assert_eq!(calls.confirmation_waits, 1);
    Ok(())
}

#[tokio::test]
async fn test_only_first_signer_is_used() -> anyhow::Result<()> {
    let signers = [random_address(), random_address(), random_address()];
    let client = MockChainClient::new(signers, random_address());

    let (result, stdout) = run(&client).await;
    result?;

    let expected = vec![
        Token::Array(vec![
            Token::Address(signers[0]),
            Token::Address(CO_OWNER.parse::<Address>()?),
        ]),
        Token::Uint(U256::from(2)),
    ];
    assert_eq!(client.calls().deploy_calls, vec![expected]);
    assert!(stdout.ends_with(&format!(
        "MultisigContract owner address: {}\n",
        to_checksum(&signers[0], None)
    )));
    Ok(())
}

#[tokio::test]
async fn test_each_step_runs_exactly_once() -> anyhow::Result<()> {
    let client = MockChainClient::new([random_address(), random_address()], random_address());

    let (result, _) = run(&client).await;
    result?;

    let calls = client.calls();
    assert_eq!(calls.signer_requests, 1);
    assert_eq!(calls.factory_requests.len(), 1);
    assert_eq!(calls.deploy_calls.len(), 1);
    assert_eq!(calls.confirmation_waits, 1);
    Ok(())
}

#[tokio::test]
async fn test_configured_parameters_reach_the_constructor() -> anyhow::Result<()> {
    let owner = random_address();
    let co_owner = random_address();
    let client = MockChainClient::new([owner], random_address());
    let params = MultisigParams {
        co_owner,
        threshold: U256::one(),
    };

    let mut out = Vec::new();
    deploy_multisig(&client, "contracts/Multisig.sol:Multisig", &params, &mut out).await?;

    let calls = client.calls();
    assert_eq!(
        calls.factory_requests,
        vec!["contracts/Multisig.sol:Multisig".to_string()]
    );
    assert_eq!(
        calls.deploy_calls,
        vec![vec![
            Token::Array(vec![Token::Address(owner), Token::Address(co_owner)]),
            Token::Uint(U256::one()),
        ]]
    );
    Ok(())
}
